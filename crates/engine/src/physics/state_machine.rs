use std::fmt::Debug;

use thiserror::Error;
use tracing::error;

/// Handler invocations allowed per tick before the machine is declared unstable.
pub const MAX_STATE_ITERATIONS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateMachineError {
    #[error("state machine did not settle after {iterations} iterations (last state {last_state})")]
    Unstable {
        iterations: usize,
        last_state: String,
    },
}

/// What a handler sees on one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateStep<S> {
    pub state: S,
    /// Previous state when this invocation follows a same-tick transition.
    pub entered_from: Option<S>,
    pub iteration: usize,
}

impl<S: Copy + Eq> StateStep<S> {
    pub fn entered_from(&self, state: S) -> bool {
        self.entered_from == Some(state)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateMachine<S> {
    current: S,
    state_at_tick_start: S,
}

impl<S> StateMachine<S>
where
    S: Copy + Eq + Debug,
{
    pub fn new(initial: S) -> Self {
        Self {
            current: initial,
            state_at_tick_start: initial,
        }
    }

    pub fn current(&self) -> S {
        self.current
    }

    pub fn state_at_tick_start(&self) -> S {
        self.state_at_tick_start
    }

    pub fn is(&self, state: S) -> bool {
        self.current == state
    }

    /// Transition from outside the handler loop (collision callbacks, triggers).
    pub fn force(&mut self, state: S) {
        self.current = state;
    }

    /// Re-runs `handler` until it returns the state it was given.
    ///
    /// Returns the number of handler invocations. On hitting the cap the
    /// machine keeps the last state it was moved to and reports
    /// [`StateMachineError::Unstable`].
    pub fn run<C, F>(&mut self, ctx: &mut C, mut handler: F) -> Result<usize, StateMachineError>
    where
        F: FnMut(StateStep<S>, &mut C) -> S,
    {
        self.state_at_tick_start = self.current;
        let mut entered_from = None;
        for iteration in 0..MAX_STATE_ITERATIONS {
            let step = StateStep {
                state: self.current,
                entered_from,
                iteration,
            };
            let next = handler(step, ctx);
            if next == self.current {
                return Ok(iteration + 1);
            }
            entered_from = Some(self.current);
            self.current = next;
        }

        let last_state = format!("{:?}", self.current);
        error!(
            iterations = MAX_STATE_ITERATIONS,
            last_state = %last_state,
            "state_machine_unstable"
        );
        Err(StateMachineError::Unstable {
            iterations: MAX_STATE_ITERATIONS,
            last_state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Light {
        Red,
        Green,
        Amber,
    }

    #[test]
    fn settles_when_handler_returns_same_state() {
        let mut machine = StateMachine::new(Light::Red);
        let mut seen = Vec::new();

        let iterations = machine
            .run(&mut seen, |step, seen: &mut Vec<StateStep<Light>>| {
                seen.push(step);
                match step.state {
                    Light::Red => Light::Green,
                    Light::Green => Light::Green,
                    Light::Amber => Light::Red,
                }
            })
            .expect("stable");

        assert_eq!(iterations, 2);
        assert_eq!(machine.current(), Light::Green);
        assert_eq!(machine.state_at_tick_start(), Light::Red);
        assert_eq!(seen[0].entered_from, None);
        assert!(seen[1].entered_from(Light::Red));
        assert_eq!(seen[1].iteration, 1);
    }

    #[test]
    fn cascading_transitions_run_in_one_tick() {
        let mut machine = StateMachine::new(Light::Red);

        let iterations = machine
            .run(&mut (), |step, _| match step.state {
                Light::Red => Light::Amber,
                Light::Amber => Light::Green,
                Light::Green => Light::Green,
            })
            .expect("stable");

        assert_eq!(iterations, 3);
        assert!(machine.is(Light::Green));
    }

    #[test]
    fn oscillation_is_capped_and_reported() {
        let mut machine = StateMachine::new(Light::Red);
        let mut calls = 0;

        let result = machine.run(&mut calls, |step, calls: &mut usize| {
            *calls += 1;
            match step.state {
                Light::Red => Light::Green,
                _ => Light::Red,
            }
        });

        assert_eq!(calls, MAX_STATE_ITERATIONS);
        assert_eq!(
            result,
            Err(StateMachineError::Unstable {
                iterations: MAX_STATE_ITERATIONS,
                last_state: "Red".to_string(),
            })
        );
        assert_eq!(machine.current(), Light::Red);
    }

    #[test]
    fn force_changes_state_outside_the_loop() {
        let mut machine = StateMachine::new(Light::Green);
        machine.force(Light::Amber);

        assert_eq!(machine.current(), Light::Amber);
        assert_eq!(machine.state_at_tick_start(), Light::Green);
    }
}
