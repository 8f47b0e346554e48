//! Front-panel UI adapters.
//!
//! [`LogDisplay`] stands in for the round LCD: it logs each screen change
//! and drops repeats.  [`FrontPanel`] joins any display with any buzzer so
//! the service can take both as one `ui` handle.

use log::info;

use crate::app::ports::{BeepPattern, BuzzerPort, DisplayPort, Screen};

/// Display adapter that renders screens to the log.
#[derive(Debug, Default)]
pub struct LogDisplay {
    current: Option<Screen>,
}

impl LogDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Screen most recently shown.
    pub fn current(&self) -> Option<Screen> {
        self.current
    }
}

impl DisplayPort for LogDisplay {
    fn show(&mut self, screen: &Screen) {
        if self.current.as_ref() == Some(screen) {
            return;
        }
        match screen {
            Screen::Blank => info!("LCD | off"),
            Screen::Logo => info!("LCD | logo"),
            Screen::FilterStatus { band, percent } => {
                info!("LCD | filter {:?} {:.1}%", band, percent);
            }
            Screen::NoFilter => info!("LCD | insert filter"),
            Screen::ModeIcon(mode) => info!("LCD | mode {}", mode.name()),
            Screen::ModeLocked { mode, pm25, air } => match (pm25, air) {
                (Some(v), Some(q)) => info!("LCD | {} | PM2.5 {} ({:?})", mode.name(), v, q),
                _ => info!("LCD | {} | PM2.5 --", mode.name()),
            },
            Screen::FilterFull { percent } => info!("LCD | replace filter ({:.0}%)", percent),
            Screen::ResetConfirmation => info!("LCD | filter reset"),
        }
        self.current = Some(*screen);
    }
}

/// A display and a buzzer presented as one UI handle.
pub struct FrontPanel<D, B> {
    pub display: D,
    pub buzzer: B,
}

impl<D: DisplayPort, B: BuzzerPort> FrontPanel<D, B> {
    pub fn new(display: D, buzzer: B) -> Self {
        Self { display, buzzer }
    }
}

impl<D: DisplayPort, B> DisplayPort for FrontPanel<D, B> {
    fn show(&mut self, screen: &Screen) {
        self.display.show(screen);
    }
}

impl<D, B: BuzzerPort> BuzzerPort for FrontPanel<D, B> {
    fn beep(&mut self, duration_ms: u32) {
        self.buzzer.beep(duration_ms);
    }

    fn play(&mut self, pattern: BeepPattern) {
        self.buzzer.play(pattern);
    }
}
