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

use crate::config::PrinterConfig;
use crate::record::BagId;

/// Label geometry in printer dots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelLayout {
    pub width_dots: u32,
    pub length_dots: u32,
}

impl Default for LabelLayout {
    fn default() -> Self {
        Self {
            width_dots: 800,
            length_dots: 600,
        }
    }
}

impl From<&PrinterConfig> for LabelLayout {
    fn from(config: &PrinterConfig) -> Self {
        Self {
            width_dots: config.width_dots,
            length_dots: config.length_dots,
        }
    }
}

impl LabelLayout {
    /// Render the bag label: weight on the first line, bag id below.
    pub fn render(&self, weight: f64, bag_id: &BagId) -> String {
        format!(
            "^XA\n\
             ^PW{width}\n\
             ^LL{length}\n\
             ^FO100,100\n\
             ^A0N,100,100\n\
             ^FDWeight: {weight}^FS\n\
             ^FO100,250\n\
             ^A0N,100,100\n\
             ^FDBagID: {bag_id}^FS\n\
             ^XZ\n",
            width = self.width_dots,
            length = self.length_dots,
            weight = sanitize_field(&weight.to_string()),
            bag_id = sanitize_field(bag_id.as_str()),
        )
    }
}

/// `^` and `~` start ZPL commands; keep them out of field data.
fn sanitize_field(value: &str) -> String {
    value.chars().filter(|c| *c != '^' && *c != '~').collect()
}
