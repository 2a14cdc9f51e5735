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

// Interactive operator menu
//
// The outer selection loop: one operation at a time, and every failure is
// printed and returns control to the menu instead of ending the process.

use anyhow::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::amend::ReweighOutcome;
use crate::batch::BATCH_CAPACITY;
use crate::command::OperatorCommand;
use crate::ingest::{IngestSummary, StopReason};
use crate::record::{BagId, WeighRecord};
use crate::station::Station;

/// Token of the operation currently holding the scale, if any
type ActiveOperation = Arc<Mutex<Option<CancellationToken>>>;

pub struct Console<R, W> {
    station: Arc<Station>,
    input: Lines<R>,
    output: W,
    shutdown: CancellationToken,
    active: ActiveOperation,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(station: Arc<Station>, input: R, output: W, shutdown: CancellationToken) -> Self {
        Self {
            station,
            input: input.lines(),
            output,
            shutdown,
            active: Arc::new(Mutex::new(None)),
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Run the menu until the operator exits, input ends or `shutdown` fires.
    ///
    /// Ctrl+C cancels the running operation and returns to the menu; at the
    /// idle menu it fires `shutdown`.
    pub async fn run(&mut self) -> Result<()> {
        let interrupts = tokio::spawn(watch_interrupts(
            self.active.clone(),
            self.shutdown.clone(),
        ));
        let result = self.menu_loop().await;
        interrupts.abort();
        result
    }

    async fn menu_loop(&mut self) -> Result<()> {
        while !self.shutdown.is_cancelled() {
            self.print_menu().await?;

            let line = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                line = self.input.next_line() => line?,
            };
            let Some(choice) = line else {
                break;
            };

            match choice.parse::<OperatorCommand>() {
                Ok(OperatorCommand::Exit) => {
                    self.say("Exiting...").await?;
                    self.shutdown.cancel();
                }
                Ok(command) => self.dispatch(command).await?,
                Err(e) => self.say(&e.to_string()).await?,
            }
        }
        Ok(())
    }

    /// Execute a single command. Operation failures are printed, only
    /// console I/O errors are returned.
    pub async fn dispatch(&mut self, command: OperatorCommand) -> Result<()> {
        let held_port = match command {
            OperatorCommand::Ingest => self.ingest().await?,
            OperatorCommand::Reweigh => self.reweigh().await?,
            OperatorCommand::Details => {
                self.details().await?;
                false
            }
            OperatorCommand::Report => {
                self.report().await?;
                false
            }
            OperatorCommand::Exit => {
                self.shutdown.cancel();
                false
            }
        };

        if held_port {
            tokio::time::sleep(self.station.reopen_delay()).await;
            let port = self.station.config().serial.port.clone();
            self.say(&format!("Closed serial port {}", port)).await?;
        }
        Ok(())
    }

    async fn print_menu(&mut self) -> Result<()> {
        let mut menu = String::from("Choose an option:\n");
        for command in OperatorCommand::ALL {
            menu.push_str(&format!("{}\n", command));
        }
        menu.push_str("Enter your choice: ");
        self.output.write_all(menu.as_bytes()).await?;
        self.output.flush().await?;
        Ok(())
    }

    async fn say(&mut self, text: &str) -> Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await?;
        Ok(())
    }

    /// Token for one operation, fired by Ctrl+C or by station shutdown
    async fn begin_operation(&self) -> CancellationToken {
        let token = self.shutdown.child_token();
        *self.active.lock().await = Some(token.clone());
        token
    }

    async fn end_operation(&self) {
        self.active.lock().await.take();
    }

    async fn prompt_bag_id(&mut self, prompt: &str) -> Result<Option<BagId>> {
        loop {
            self.say(prompt).await?;
            let Some(line) = self.input.next_line().await? else {
                return Ok(None);
            };
            match BagId::parse(&line) {
                Ok(bag_id) => return Ok(Some(bag_id)),
                Err(_) => self.say("Invalid input. Please enter a numeric Bag ID.").await?,
            }
        }
    }

    /// Returns whether the serial port was opened
    async fn ingest(&mut self) -> Result<bool> {
        let port = self.station.config().serial.port.clone();
        self.say(&format!(
            "Reading data from serial port {}... Send '0' to return to the main menu.",
            port
        ))
        .await?;

        let transport = match self.station.open_transport() {
            Ok(transport) => transport,
            Err(e) => {
                error!("Ingestion failed: {}", e);
                self.say(&format!("An error occurred: {}", e)).await?;
                return Ok(false);
            }
        };

        let cancel = self.begin_operation().await;
        let result = self.station.ingest_from(transport, &cancel).await;
        self.end_operation().await;

        match result {
            Ok(summary) => self.say(&describe_ingest(&summary)).await?,
            Err(e) => {
                error!("Ingestion failed: {}", e);
                self.say(&format!("An error occurred: {}", e)).await?
            }
        }
        Ok(true)
    }

    /// Returns whether the serial port was opened
    async fn reweigh(&mut self) -> Result<bool> {
        self.say("Update is used if a bag is broken or incorrectly weighed").await?;
        let Some(bag_id) = self
            .prompt_bag_id("Please enter the Bag ID for the bag that needs reweighing")
            .await?
        else {
            return Ok(false);
        };

        let transport = match self.station.open_transport() {
            Ok(transport) => transport,
            Err(e) => {
                error!("Reweigh failed: {}", e);
                self.say(&format!("An error occurred: {}", e)).await?;
                return Ok(false);
            }
        };

        let cancel = self.begin_operation().await;
        let result = self.station.reweigh_from(transport, &bag_id, &cancel).await;
        self.end_operation().await;

        let message = match result {
            Ok(ReweighOutcome::Updated { current, .. }) => format!(
                "Bag ID {} reweighed successfully: New weight {} kg at {}",
                current.bag_id, current.gross_weight, current.timestamp
            ),
            Ok(ReweighOutcome::NotFound { bag_id, weight }) => format!(
                "No bag with ID {} in the ledger; reading of {} kg discarded",
                bag_id, weight
            ),
            Ok(ReweighOutcome::Cancelled) => "Interrupted by user. Exiting to menu.".to_string(),
            Err(e) => {
                error!("Reweigh failed: {}", e);
                format!("An error occurred: {}", e)
            }
        };
        self.say(&message).await?;
        Ok(true)
    }

    async fn details(&mut self) -> Result<()> {
        let Some(bag_id) = self.prompt_bag_id("Enter the Bag ID to view details:").await? else {
            return Ok(());
        };

        let message = match self.station.details(&bag_id).await {
            Ok(Some(record)) => describe_record(&record),
            Ok(None) => format!("No details found for BagID {}", bag_id),
            Err(e) => format!("An error occurred: {}", e),
        };
        self.say(&message).await
    }

    async fn report(&mut self) -> Result<()> {
        let message = match self.station.export_report().await {
            Ok(path) => format!("Report saved to {}", path.display()),
            Err(e) => {
                error!("Report export failed: {}", e);
                format!("An error occurred while exporting the report: {}", e)
            }
        };
        self.say(&message).await
    }
}

async fn watch_interrupts(active: ActiveOperation, shutdown: CancellationToken) {
    while tokio::signal::ctrl_c().await.is_ok() {
        if !route_interrupt(&active, &shutdown).await {
            break;
        }
    }
}

/// Deliver one Ctrl+C: cancel the running operation, or fire `shutdown`
/// when the menu is idle. Returns whether the console keeps running.
async fn route_interrupt(
    active: &Mutex<Option<CancellationToken>>,
    shutdown: &CancellationToken,
) -> bool {
    match active.lock().await.take() {
        Some(operation) => {
            warn!("Interrupted by user. Exiting to menu.");
            operation.cancel();
            true
        }
        None => {
            warn!("Interrupted at the menu, exiting");
            shutdown.cancel();
            false
        }
    }
}

pub fn describe_record(record: &WeighRecord) -> String {
    format!(
        "Details for BagID {id}:\n\
         BagID: {id}\n\
         GrossWeight: {weight}\n\
         Date and Time: {time}\n\
         Batch Number: {batch}\n\
         Product Type: {product}",
        id = record.bag_id,
        weight = record.gross_weight,
        time = record.timestamp,
        batch = record.batch_number,
        product = record.product_type,
    )
}

pub fn describe_ingest(summary: &IngestSummary) -> String {
    let ending = match summary.stop {
        StopReason::BatchFull => format!("Batch {} is full.", summary.start.batch),
        StopReason::Sentinel => "Returned to the main menu.".to_string(),
        StopReason::Cancelled => "Interrupted by user. Exiting to menu.".to_string(),
    };
    format!(
        "Recorded {} bag(s), skipped {} unreadable line(s). Next batch {} holds {}/{}. {}",
        summary.recorded.len(),
        summary.rejected,
        summary.next.batch,
        summary.next.filled,
        BATCH_CAPACITY,
        ending
    )
}
