use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// The six discrete driving controls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Control {
    Forward,
    Left,
    Back,
    Right,
    Handbrake,
    Boost,
}

impl Control {
    pub const ALL: [Control; 6] = [
        Control::Forward,
        Control::Left,
        Control::Back,
        Control::Right,
        Control::Handbrake,
        Control::Boost,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Control::Forward => "forward",
            Control::Left => "left",
            Control::Back => "back",
            Control::Right => "right",
            Control::Handbrake => "handbrake",
            Control::Boost => "boost",
        }
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown control '{0}'")]
pub struct UnknownControl(pub String);

impl FromStr for Control {
    type Err = UnknownControl;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Control::ALL
            .into_iter()
            .find(|control| control.name() == s)
            .ok_or_else(|| UnknownControl(s.to_string()))
    }
}

/// Which controls are held, as read at the start of a tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    pub forward: bool,
    pub left: bool,
    pub back: bool,
    pub right: bool,
    pub handbrake: bool,
    pub boost: bool,
}

impl InputSnapshot {
    pub fn set(&mut self, control: Control) {
        *self.flag_mut(control) = true;
    }

    pub fn clear(&mut self, control: Control) {
        *self.flag_mut(control) = false;
    }

    pub fn is_held(&self, control: Control) -> bool {
        match control {
            Control::Forward => self.forward,
            Control::Left => self.left,
            Control::Back => self.back,
            Control::Right => self.right,
            Control::Handbrake => self.handbrake,
            Control::Boost => self.boost,
        }
    }

    pub fn with(mut self, control: Control) -> Self {
        self.set(control);
        self
    }

    fn flag_mut(&mut self, control: Control) -> &mut bool {
        match control {
            Control::Forward => &mut self.forward,
            Control::Left => &mut self.left,
            Control::Back => &mut self.back,
            Control::Right => &mut self.right,
            Control::Handbrake => &mut self.handbrake,
            Control::Boost => &mut self.boost,
        }
    }
}

/// Input flags shared between any number of input sources and the
/// simulation. Each flag is independent; there is no cross-flag atomicity.
#[derive(Clone, Debug, Default)]
pub struct SharedInput {
    flags: Arc<[AtomicBool; 6]>,
}

impl SharedInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, control: Control) {
        self.flags[control.index()].store(true, Ordering::Relaxed);
    }

    pub fn clear(&self, control: Control) {
        self.flags[control.index()].store(false, Ordering::Relaxed);
    }

    pub fn clear_all(&self) {
        for control in Control::ALL {
            self.clear(control);
        }
    }

    pub fn snapshot(&self) -> InputSnapshot {
        let mut snapshot = InputSnapshot::default();
        for control in Control::ALL {
            if self.flags[control.index()].load(Ordering::Relaxed) {
                snapshot.set(control);
            }
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn snapshot_starts_released() {
        let input = SharedInput::new();
        assert_eq!(input.snapshot(), InputSnapshot::default());
    }

    #[test]
    fn set_and_clear_touch_only_their_flag() {
        let mut snapshot = InputSnapshot::default();
        snapshot.set(Control::Forward);
        snapshot.set(Control::Boost);
        snapshot.clear(Control::Forward);
        assert!(!snapshot.forward);
        assert!(snapshot.boost);
        assert!(!snapshot.is_held(Control::Left));
    }

    #[test]
    fn sources_on_other_threads_are_visible_to_snapshot() {
        let input = SharedInput::new();
        let keyboard = input.clone();
        let touch = input.clone();

        thread::spawn(move || keyboard.set(Control::Forward))
            .join()
            .unwrap();
        thread::spawn(move || {
            touch.set(Control::Right);
            touch.set(Control::Handbrake);
            touch.clear(Control::Handbrake);
        })
        .join()
        .unwrap();

        let snapshot = input.snapshot();
        assert_eq!(
            snapshot,
            InputSnapshot::default()
                .with(Control::Forward)
                .with(Control::Right)
        );

        input.clear_all();
        assert_eq!(input.snapshot(), InputSnapshot::default());
    }

    #[test]
    fn controls_parse_from_their_names() {
        for control in Control::ALL {
            assert_eq!(control.name().parse::<Control>(), Ok(control));
        }
        assert_eq!(
            "jump".parse::<Control>(),
            Err(UnknownControl("jump".to_string()))
        );
    }
}
