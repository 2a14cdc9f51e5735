// Copyright 2025 coScene
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Ledger module
//
// Provides a trait-based abstraction over the durable record ledger,
// so the ingestion, amendment and query paths can run against a CSV
// file on disk or an in-memory store.
//
// Ingestion only appends. Amendment rewrites the whole ledger through
// `replace_all`, which must never leave a partially written ledger.

pub mod csv_file;
pub mod factory;
pub mod memory;
pub mod store;

pub use csv_file::{CsvLedger, LEDGER_HEADER};
pub use factory::LedgerFactory;
pub use memory::MemoryLedger;
pub use store::RecordStore;
