//! Recording fake `MaestroClient` shared by the integration tests.

#![allow(dead_code)]

use maestro_ioboard::{
    ClientEvent, Error, MaestroBoard, MaestroClient, PortEnumerator, Responder, Result, SerialMode,
    SerialPortEntry,
};
use std::collections::{HashMap, VecDeque};
use std::fmt;

/// A primitive call the board made on the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SetTarget(u8, u16),
    SetPwm(u16, u16),
    Set8BitTarget(u8, u8),
    DigitalWrite(u8, bool),
    DigitalRead(u8),
    AnalogRead(u8),
    RestartScript(u8),
}

/// Records every primitive and keeps responders until the test answers them.
pub struct RecordingClient {
    pub mode: SerialMode,
    pub calls: Vec<Call>,
    pub events: VecDeque<ClientEvent>,
    pub script_responders: VecDeque<(u8, Responder<Vec<u8>>)>,
    pub analog_responders: VecDeque<(u8, Responder<u16>)>,
    pub digital_responders: VecDeque<(u8, Responder<bool>)>,
    /// Script outputs answered synchronously from inside the primitive.
    pub auto_scripts: HashMap<u8, Vec<u8>>,
    /// Makes every primitive fail as if the link were down.
    pub fail_sends: bool,
    /// Makes script requests fail after `auto_scripts` already answered them.
    pub fail_after_answer: bool,
}

impl fmt::Debug for RecordingClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingClient")
            .field("mode", &self.mode)
            .field("calls", &self.calls)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

impl RecordingClient {
    pub fn new() -> Self {
        Self::with_mode(SerialMode::UsbDualPort)
    }

    pub fn with_mode(mode: SerialMode) -> Self {
        RecordingClient {
            mode,
            calls: Vec::new(),
            events: VecDeque::new(),
            script_responders: VecDeque::new(),
            analog_responders: VecDeque::new(),
            digital_responders: VecDeque::new(),
            auto_scripts: HashMap::new(),
            fail_sends: false,
            fail_after_answer: false,
        }
    }

    fn record(&mut self, call: Call) -> Result<()> {
        if self.fail_sends {
            return Err(Error::Transport {
                code: -1,
                message: "link down".to_string(),
            });
        }
        self.calls.push(call);
        Ok(())
    }
}

impl MaestroClient for RecordingClient {
    fn serial_mode(&self) -> SerialMode {
        self.mode
    }

    fn next_event(&mut self) -> Option<ClientEvent> {
        self.events.pop_front()
    }

    fn set_target(&mut self, channel: u8, target: u16) -> Result<()> {
        self.record(Call::SetTarget(channel, target))
    }

    fn set_pwm(&mut self, on_time: u16, period: u16) -> Result<()> {
        self.record(Call::SetPwm(on_time, period))
    }

    fn set_8bit_target(&mut self, channel: u8, value: u8) -> Result<()> {
        self.record(Call::Set8BitTarget(channel, value))
    }

    fn digital_write(&mut self, channel: u8, level: bool) -> Result<()> {
        self.record(Call::DigitalWrite(channel, level))
    }

    fn digital_read(&mut self, channel: u8, respond: Responder<bool>) -> Result<()> {
        self.record(Call::DigitalRead(channel))?;
        self.digital_responders.push_back((channel, respond));
        Ok(())
    }

    fn analog_read(&mut self, channel: u8, respond: Responder<u16>) -> Result<()> {
        self.record(Call::AnalogRead(channel))?;
        self.analog_responders.push_back((channel, respond));
        Ok(())
    }

    fn restart_script_at_subroutine(
        &mut self,
        subroutine: u8,
        respond: Responder<Vec<u8>>,
    ) -> Result<()> {
        self.record(Call::RestartScript(subroutine))?;
        match self.auto_scripts.get(&subroutine) {
            Some(output) => respond(output.clone()),
            None => self.script_responders.push_back((subroutine, respond)),
        }
        if self.fail_after_answer {
            return Err(Error::Transport {
                code: -2,
                message: "write timed out".to_string(),
            });
        }
        Ok(())
    }
}

/// Answers the oldest script request. Returns the subroutine it was for.
pub fn answer_script(board: &mut MaestroBoard<RecordingClient>, output: &[u8]) -> Option<u8> {
    let (subroutine, respond) = board.client_mut().script_responders.pop_front()?;
    respond(output.to_vec());
    Some(subroutine)
}

pub fn answer_analog(board: &mut MaestroBoard<RecordingClient>, value: u16) -> Option<u8> {
    let (channel, respond) = board.client_mut().analog_responders.pop_front()?;
    respond(value);
    Some(channel)
}

pub fn answer_digital(board: &mut MaestroBoard<RecordingClient>, level: bool) -> Option<u8> {
    let (channel, respond) = board.client_mut().digital_responders.pop_front()?;
    respond(level);
    Some(channel)
}

/// Enumerator returning a fixed port list, or an error when `fail` is set.
pub struct FixedPorts {
    pub names: Vec<&'static str>,
    pub fail: bool,
}

impl FixedPorts {
    pub fn new(names: &[&'static str]) -> Self {
        FixedPorts {
            names: names.to_vec(),
            fail: false,
        }
    }
}

impl PortEnumerator for FixedPorts {
    fn list_ports(&self) -> Result<Vec<SerialPortEntry>> {
        if self.fail {
            return Err(Error::Serial(serialport::Error::new(
                serialport::ErrorKind::NoDevice,
                "enumeration unavailable",
            )));
        }
        Ok(self
            .names
            .iter()
            .enumerate()
            .map(|(order, name)| SerialPortEntry::new(*name, order))
            .collect())
    }
}
