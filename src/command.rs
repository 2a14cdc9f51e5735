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

use std::fmt;
use std::str::FromStr;

/// Operator commands offered by the station menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCommand {
    Ingest,
    Reweigh,
    Details,
    Report,
    Exit,
}

impl OperatorCommand {
    /// Menu order
    pub const ALL: [OperatorCommand; 5] = [
        OperatorCommand::Ingest,
        OperatorCommand::Reweigh,
        OperatorCommand::Details,
        OperatorCommand::Report,
        OperatorCommand::Exit,
    ];

    pub fn menu_number(self) -> u8 {
        match self {
            OperatorCommand::Ingest => 1,
            OperatorCommand::Reweigh => 2,
            OperatorCommand::Details => 3,
            OperatorCommand::Report => 4,
            OperatorCommand::Exit => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OperatorCommand::Ingest => "Read Serial Data",
            OperatorCommand::Reweigh => "Update Bag Weight",
            OperatorCommand::Details => "View Bag Details",
            OperatorCommand::Report => "Print Report",
            OperatorCommand::Exit => "Exit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCommand(pub String);

impl fmt::Display for UnknownCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid choice '{}'. Please enter a number between 1 and 5",
            self.0
        )
    }
}

impl std::error::Error for UnknownCommand {}

impl FromStr for OperatorCommand {
    type Err = UnknownCommand;

    /// Accepts the menu number or the command name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let choice = s.trim().to_ascii_lowercase();
        match choice.as_str() {
            "1" | "ingest" => Ok(OperatorCommand::Ingest),
            "2" | "reweigh" | "update" => Ok(OperatorCommand::Reweigh),
            "3" | "details" | "show" => Ok(OperatorCommand::Details),
            "4" | "report" => Ok(OperatorCommand::Report),
            "5" | "exit" | "quit" => Ok(OperatorCommand::Exit),
            _ => Err(UnknownCommand(s.trim().to_string())),
        }
    }
}

impl fmt::Display for OperatorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}) {}", self.menu_number(), self.label())
    }
}
