use std::io::Write;

use shop_core::{ConfigError, ShopStatus, StatusEvent};

/// Receives workflow progress for display.
pub trait StatusReporter {
    fn report(&mut self, event: &StatusEvent);
    fn configuration_error(&mut self, err: &ConfigError);
}

/// Prints one line per status event.
pub struct TerminalStatusReporter<W: Write> {
    out: W,
}

impl<W: Write> TerminalStatusReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> StatusReporter for TerminalStatusReporter<W> {
    fn report(&mut self, event: &StatusEvent) {
        let _ = writeln!(self.out, "{}", format_status(event));
    }

    fn configuration_error(&mut self, err: &ConfigError) {
        let _ = writeln!(self.out, "configuration error: {err}");
    }
}

pub fn format_status(event: &StatusEvent) -> String {
    let step = format!("[{} {}/{}]", event.track, event.progress, event.total);
    match &event.state {
        ShopStatus::Submitting if event.progress == 0 => format!("{step} fetching forum page"),
        ShopStatus::Submitting => format!("{step} submitting"),
        ShopStatus::Completed => format!("{step} done"),
        ShopStatus::Failed(reason) => format!("{step} failed: {reason}"),
    }
}
