#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveLeft,
    MoveRight,
    Jump,
    Crouch,
    Fire,
    Reload,
    Pause,
    Quit,
}

const ACTION_COUNT: usize = 8;

impl InputAction {
    pub const ALL: [InputAction; ACTION_COUNT] = [
        InputAction::MoveLeft,
        InputAction::MoveRight,
        InputAction::Jump,
        InputAction::Crouch,
        InputAction::Fire,
        InputAction::Reload,
        InputAction::Pause,
        InputAction::Quit,
    ];

    const fn index(self) -> usize {
        match self {
            InputAction::MoveLeft => 0,
            InputAction::MoveRight => 1,
            InputAction::Jump => 2,
            InputAction::Crouch => 3,
            InputAction::Fire => 4,
            InputAction::Reload => 5,
            InputAction::Pause => 6,
            InputAction::Quit => 7,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

/// Keyboard state sampled once per fixed tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    quit_requested: bool,
    actions: ActionStates,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(quit_requested: bool, actions: ActionStates) -> Self {
        Self {
            quit_requested,
            actions,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn is_up(&self, action: InputAction) -> bool {
        !self.actions.is_down(action)
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }
}

/// Turns held keys into one-shot presses.
///
/// A locked action reads as not pressed until the key is observed up again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyLocker {
    locked: ActionStates,
}

impl KeyLocker {
    pub fn lock(&mut self, action: InputAction) {
        self.locked.set(action, true);
    }

    pub fn unlock(&mut self, action: InputAction) {
        self.locked.set(action, false);
    }

    pub fn is_locked(&self, action: InputAction) -> bool {
        self.locked.is_down(action)
    }

    /// True on the first tick `action` is seen down; locks it until released.
    pub fn take_press(&mut self, input: &InputSnapshot, action: InputAction) -> bool {
        if input.is_down(action) && !self.is_locked(action) {
            self.lock(action);
            return true;
        }
        false
    }

    /// Releases every lock whose key is currently up.
    pub fn refresh(&mut self, input: &InputSnapshot) {
        for action in InputAction::ALL {
            if input.is_up(action) {
                self.unlock(action);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_unique() {
        let mut seen = [false; ACTION_COUNT];
        for action in InputAction::ALL {
            assert!(!seen[action.index()], "{action:?}");
            seen[action.index()] = true;
        }
    }

    #[test]
    fn snapshot_builder_sets_actions() {
        let input = InputSnapshot::empty()
            .with_action_down(InputAction::Jump, true)
            .with_action_down(InputAction::MoveLeft, true)
            .with_action_down(InputAction::MoveLeft, false);

        assert!(input.is_down(InputAction::Jump));
        assert!(input.is_up(InputAction::MoveLeft));
        assert!(!input.quit_requested());
    }

    #[test]
    fn held_key_fires_once_until_released() {
        let mut locker = KeyLocker::default();
        let held = InputSnapshot::empty().with_action_down(InputAction::Pause, true);
        let released = InputSnapshot::empty();

        assert!(locker.take_press(&held, InputAction::Pause));
        locker.refresh(&held);
        assert!(!locker.take_press(&held, InputAction::Pause));

        locker.refresh(&released);
        assert!(!locker.is_locked(InputAction::Pause));
        assert!(locker.take_press(&held, InputAction::Pause));
    }

    #[test]
    fn manual_lock_survives_while_key_is_down() {
        let mut locker = KeyLocker::default();
        let held = InputSnapshot::empty().with_action_down(InputAction::Jump, true);

        locker.lock(InputAction::Jump);
        locker.refresh(&held);

        assert!(locker.is_locked(InputAction::Jump));
        assert!(!locker.take_press(&held, InputAction::Jump));
    }
}
