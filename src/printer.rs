//! Printer session over a [`Transport`].
//!
//! The session only moves bytes and interprets status packets; jobs are
//! built beforehand with [`crate::build`].

use std::time::Duration;

use log::{debug, info, warn};

use crate::{
    error::Error,
    instruction::{status_request, Instruction, SettingAction},
    labels::LabelProfile,
    model::ModelProfile,
    raster::RasterJob,
    status::{Phase, StatusPacket, StatusType, STATUS_LEN},
    transport::Transport,
};

/// Device settings reachable with the `ESC i U` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    /// Auto power off delay, in steps of 10 minutes (0 disables).
    AutoPowerOff,
    /// Power on when the adapter is plugged in (0 or 1).
    AutoPowerOn,
}

impl Setting {
    fn code(&self) -> u8 {
        match self {
            Self::AutoPowerOff => 0x41,
            Self::AutoPowerOn => 0x70,
        }
    }

    /// The QL-500 family expects an extra 0x00 before the power off delay.
    fn prefix(&self, series_code: u8) -> Vec<u8> {
        match self {
            Self::AutoPowerOff if series_code == 0x30 => vec![0x00],
            _ => Vec::new(),
        }
    }
}

pub struct Printer<T> {
    transport: T,
    model: &'static ModelProfile,
    read_timeout: Duration,
    max_reads: usize,
}

impl<T: Transport> Printer<T> {
    pub fn new(transport: T, model: &'static ModelProfile) -> Self {
        Printer {
            transport,
            model,
            read_timeout: Duration::from_secs(1),
            max_reads: 10,
        }
    }

    /// How long one read waits, and how many reads a status wait may take.
    pub fn set_read_timeout(self, read_timeout: Duration, max_reads: usize) -> Self {
        Printer {
            read_timeout,
            max_reads,
            ..self
        }
    }

    pub fn model(&self) -> &'static ModelProfile {
        self.model
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Request and read the printer status.
    ///
    /// Convenient for inspection when a new media is added.
    pub fn status(&mut self) -> Result<StatusPacket, Error> {
        self.transport.send(&status_request(self.model.invalidate_bytes))?;
        self.read_status()
    }

    /// Check that the installed media is `label`.
    pub fn check_media(&mut self, label: &LabelProfile) -> Result<StatusPacket, Error> {
        let status = self.status()?;
        let actual = status.label().map(|l| l.id);
        if actual != Some(label.id) {
            return Err(Error::MediaMismatch {
                expected: label.id,
                actual,
            });
        }
        Ok(status)
    }

    /// Send `job` and wait until the printer reports every page printed
    /// and is ready for the next job. The job is never resent.
    ///
    /// Each page gets `max_reads` reads to complete.
    pub fn print(&mut self, job: &RasterJob) -> Result<StatusPacket, Error> {
        let data = job.to_bytes();
        let pages = job.pages();
        info!(
            "Sending {} bytes ({} pages) to the {}",
            data.len(),
            pages,
            self.model.id
        );
        self.transport.send(&data)?;

        let mut completed = 0;
        let mut ready = false;
        for _ in 0..self.max_reads * pages.max(1) {
            let status = match self.receive_status()? {
                Some(status) => status,
                None => continue,
            };
            if status.has_errors() {
                warn!("Printer reported faults: {:?}", status.faults);
                return Err(device_error(&status));
            }
            match status.status_type {
                StatusType::PrintingCompleted => {
                    completed += 1;
                    ready = false;
                    debug!("Page {} of {} printed", completed, pages);
                }
                StatusType::PhaseChange if status.phase == Phase::Receiving => ready = true,
                StatusType::ErrorOccurred => return Err(device_error(&status)),
                StatusType::TurnedOff => return Err(Error::DeviceOffline),
                _ => {}
            }
            if completed >= pages && ready {
                info!("Printing was successful, waiting for the next job");
                return Ok(status);
            }
        }

        if completed < pages {
            warn!("'printing completed' received for {} of {} pages", completed, pages);
        }
        if !ready {
            warn!("'waiting to receive' status not received");
        }
        Err(Error::ReadStatusTimeout)
    }

    /// Abort whatever the printer is receiving.
    pub fn cancel(&mut self) -> Result<(), Error> {
        let mut buf = Vec::new();
        Instruction::Invalidate(self.model.invalidate_bytes).encode(&mut buf);
        Instruction::Initialize.encode(&mut buf);
        self.transport.send(&buf)
    }

    pub fn read_setting(&mut self, setting: Setting) -> Result<u8, Error> {
        let status = self.idle_status()?;
        self.send_setting(setting, SettingAction::Read, setting.prefix(status.series_code))?;

        let report = self.read_status()?;
        match (report.status_type, report.setting) {
            (StatusType::SettingsReport, Some(value)) => {
                debug!("{:?} is {}", setting, value);
                Ok(value)
            }
            (status_type, _) => Err(Error::UnexpectedStatus(status_type)),
        }
    }

    pub fn write_setting(&mut self, setting: Setting, value: u8) -> Result<(), Error> {
        let status = self.idle_status()?;
        let mut payload = setting.prefix(status.series_code);
        payload.push(value);
        self.send_setting(setting, SettingAction::Write, payload)?;
        self.idle_status()?;
        info!("{:?} set to {}", setting, value);
        Ok(())
    }

    fn send_setting(
        &mut self,
        setting: Setting,
        action: SettingAction,
        payload: Vec<u8>,
    ) -> Result<(), Error> {
        let mut buf = Vec::new();
        Instruction::SwitchToRaster.encode(&mut buf);
        Instruction::Setting {
            code: setting.code(),
            action,
            payload,
        }
        .encode(&mut buf);
        self.transport.send(&buf)
    }

    /// Status that must be a plain reply without faults.
    fn idle_status(&mut self) -> Result<StatusPacket, Error> {
        let status = self.status()?;
        if status.has_errors() {
            return Err(device_error(&status));
        }
        if status.status_type != StatusType::ReplyToRequest {
            return Err(Error::UnexpectedStatus(status.status_type));
        }
        Ok(status)
    }

    fn read_status(&mut self) -> Result<StatusPacket, Error> {
        for _ in 0..self.max_reads {
            if let Some(status) = self.receive_status()? {
                return Ok(status);
            }
        }
        Err(Error::ReadStatusTimeout)
    }

    fn receive_status(&mut self) -> Result<Option<StatusPacket>, Error> {
        let buf = self.transport.receive(self.read_timeout)?;
        match buf.len() {
            0 => Ok(None),
            STATUS_LEN => Ok(Some(StatusPacket::parse(&buf)?)),
            n => {
                debug!("Ignoring {} byte response: {:X?}", n, buf);
                Ok(None)
            }
        }
    }
}

fn device_error(status: &StatusPacket) -> Error {
    Error::Device {
        faults: status.faults,
        unrecognized: status.unrecognized_faults,
    }
}
