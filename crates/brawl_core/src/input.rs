//! Keyboard + gamepad input normalised into per-frame action snapshots.
//!
//! - **Level-triggered (held):** true every snapshot while any bound key is
//!   physically down, or while the gamepad stick / button is engaged.
//!
//! - **Edge-triggered (pressed):** true only in the first snapshot taken after
//!   the up->down transition. [`InputController::snapshot`] is the frame
//!   boundary: it consumes the pending key presses and latches the gamepad
//!   buttons as "previous". [`InputController::debug_snapshot`] derives the
//!   same data without consuming anything, so overlays can poll it freely.
//!
//! The host owns the actual OS listeners and forwards events through
//! [`InputController::key_down`] / [`InputController::key_up`] while attached.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

/// Raw stick values below this magnitude read as zero.
pub const GAMEPAD_AXIS_DEADZONE: f32 = 0.15;
/// Stick deflection required to count as holding left / right.
pub const GAMEPAD_HOLD_THRESHOLD: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Space,
    Shift,
    Enter,
    Backspace,
    Escape,
    A,
    D,
    E,
    J,
    P,
    S,
    W,
    X,
    Z,
}

impl Key {
    /// Maps a DOM `KeyboardEvent.key` value. Letters match either case.
    pub fn from_dom_key(key: &str) -> Option<Key> {
        let key = match key {
            "ArrowLeft" => Key::ArrowLeft,
            "ArrowRight" => Key::ArrowRight,
            "ArrowUp" => Key::ArrowUp,
            "ArrowDown" => Key::ArrowDown,
            " " | "Space" | "Spacebar" => Key::Space,
            "Shift" => Key::Shift,
            "Enter" => Key::Enter,
            "Backspace" => Key::Backspace,
            "Escape" => Key::Escape,
            "a" | "A" => Key::A,
            "d" | "D" => Key::D,
            "e" | "E" => Key::E,
            "j" | "J" => Key::J,
            "p" | "P" => Key::P,
            "s" | "S" => Key::S,
            "w" | "W" => Key::W,
            "x" | "X" => Key::X,
            "z" | "Z" => Key::Z,
            _ => return None,
        };
        Some(key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Left,
    Right,
    Up,
    Down,
    Jump,
    Dash,
    Attack,
    Confirm,
    Back,
    Pause,
}

impl Action {
    pub const COUNT: usize = 10;

    pub const ALL: [Action; Action::COUNT] = [
        Action::Left,
        Action::Right,
        Action::Up,
        Action::Down,
        Action::Jump,
        Action::Dash,
        Action::Attack,
        Action::Confirm,
        Action::Back,
        Action::Pause,
    ];

    pub fn keys(self) -> &'static [Key] {
        match self {
            Action::Left => &[Key::ArrowLeft, Key::A],
            Action::Right => &[Key::ArrowRight, Key::D],
            Action::Up => &[Key::ArrowUp, Key::W],
            Action::Down => &[Key::ArrowDown, Key::S],
            Action::Jump => &[Key::Space],
            Action::Dash => &[Key::Shift, Key::X],
            Action::Attack => &[Key::Z, Key::J],
            Action::Confirm => &[Key::Enter, Key::E],
            Action::Back => &[Key::Backspace],
            Action::Pause => &[Key::Escape, Key::P],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Action::Left => "left",
            Action::Right => "right",
            Action::Up => "up",
            Action::Down => "down",
            Action::Jump => "jump",
            Action::Dash => "dash",
            Action::Attack => "attack",
            Action::Confirm => "confirm",
            Action::Back => "back",
            Action::Pause => "pause",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActionState {
    pub held: bool,
    pub pressed: bool,
}

/// Dense per-action table, indexed by [`Action`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionSet([ActionState; Action::COUNT]);

impl ActionSet {
    fn from_keys(held: &HashSet<Key>, pressed: &HashSet<Key>) -> Self {
        let mut set = Self::default();
        for action in Action::ALL {
            let keys = action.keys();
            set.0[action.index()] = ActionState {
                held: keys.iter().any(|k| held.contains(k)),
                pressed: keys.iter().any(|k| pressed.contains(k)),
            };
        }
        set
    }

    pub fn get(&self, action: Action) -> ActionState {
        self.0[action.index()]
    }

    pub fn get_mut(&mut self, action: Action) -> &mut ActionState {
        &mut self.0[action.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Action, ActionState)> + '_ {
        Action::ALL.iter().map(move |&a| (a, self.get(a)))
    }
}

impl Serialize for ActionSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(Action::COUNT))?;
        for (action, state) in self.iter() {
            map.serialize_entry(action.label(), &state)?;
        }
        map.end()
    }
}

/// Raw view of the first connected pad, as exposed by the host polling API.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawGamepad {
    pub axes: Vec<f32>,
    pub buttons: Vec<bool>,
}

/// Polling access to connected gamepads.
pub trait GamepadSource {
    /// The first connected pad, or `None` when nothing is plugged in.
    fn first_connected(&self) -> Option<RawGamepad>;
}

/// Source for hosts without gamepad support.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGamepad;

impl GamepadSource for NoGamepad {
    fn first_connected(&self) -> Option<RawGamepad> {
        None
    }
}

/// Gamepad reduced to what the game binds: stick X plus three logical buttons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GamepadState {
    pub axis_x: f32,
    pub jump: bool,
    pub dash: bool,
    pub attack: bool,
}

impl GamepadState {
    /// Missing axes or buttons (or no pad at all) read as neutral.
    pub fn from_raw(raw: Option<&RawGamepad>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };
        let button = |i: usize| raw.buttons.get(i).copied().unwrap_or(false);
        let axis = raw.axes.first().copied().unwrap_or(0.0);
        let axis_x = if axis.is_finite() && axis.abs() > GAMEPAD_AXIS_DEADZONE {
            axis
        } else {
            0.0
        };
        Self {
            axis_x,
            jump: button(0),
            dash: button(1) || button(2),
            attack: button(3),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GamepadSnapshot {
    pub state: GamepadState,
    pub left_held: bool,
    pub right_held: bool,
    pub jump_pressed: bool,
    pub dash_pressed: bool,
    pub attack_pressed: bool,
}

/// Everything a scene needs to know about input for one rendered frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InputSnapshot {
    pub actions: ActionSet,
    pub gamepad: GamepadSnapshot,
    pub held_keys: BTreeSet<Key>,
}

impl InputSnapshot {
    pub fn held(&self, action: Action) -> bool {
        self.actions.get(action).held
    }

    pub fn pressed(&self, action: Action) -> bool {
        self.actions.get(action).pressed
    }

    /// Copy with every press edge cleared; held state is kept.
    pub fn without_edges(&self) -> Self {
        let mut out = self.clone();
        for action in Action::ALL {
            out.actions.get_mut(action).pressed = false;
        }
        out.gamepad.jump_pressed = false;
        out.gamepad.dash_pressed = false;
        out.gamepad.attack_pressed = false;
        out
    }

    /// ORs the press edges of an older, unconsumed snapshot into this one.
    pub fn merge_edges_from(&mut self, older: &InputSnapshot) {
        for action in Action::ALL {
            if older.pressed(action) {
                self.actions.get_mut(action).pressed = true;
            }
        }
        self.gamepad.jump_pressed |= older.gamepad.jump_pressed;
        self.gamepad.dash_pressed |= older.gamepad.dash_pressed;
        self.gamepad.attack_pressed |= older.gamepad.attack_pressed;
    }

    pub fn has_edges(&self) -> bool {
        self.actions.iter().any(|(_, state)| state.pressed)
    }
}

pub struct InputController {
    held: HashSet<Key>,
    pressed: HashSet<Key>,
    prev_gamepad: GamepadState,
    attached: bool,
    gamepads: Box<dyn GamepadSource>,
}

impl InputController {
    pub fn new() -> Self {
        Self::with_gamepads(Box::new(NoGamepad))
    }

    pub fn with_gamepads(gamepads: Box<dyn GamepadSource>) -> Self {
        Self {
            held: HashSet::new(),
            pressed: HashSet::new(),
            prev_gamepad: GamepadState::default(),
            attached: false,
            gamepads,
        }
    }

    /// Starts accepting key events. Idempotent.
    pub fn attach(&mut self) {
        if self.attached {
            return;
        }
        self.attached = true;
        log::debug!("Input attached");
    }

    /// Stops accepting key events and forgets any keys still held. Idempotent.
    pub fn detach(&mut self) {
        if !self.attached {
            return;
        }
        self.attached = false;
        self.held.clear();
        self.pressed.clear();
        self.prev_gamepad = GamepadState::default();
        log::debug!("Input detached");
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Records a key press. Returns true when the host should suppress the
    /// event's default action; every [`Key`] is bound to some action, so that
    /// is whenever input is attached.
    pub fn key_down(&mut self, key: Key) -> bool {
        if !self.attached {
            return false;
        }
        // Auto-repeat keeps the key in `held`, so only the first down is an edge.
        if self.held.insert(key) {
            self.pressed.insert(key);
        }
        true
    }

    /// Records a key release. The pending press (if any) stays queued so a tap
    /// shorter than one frame still reaches the next snapshot.
    pub fn key_up(&mut self, key: Key) -> bool {
        if !self.attached {
            return false;
        }
        self.held.remove(&key);
        true
    }

    /// Frame-boundary snapshot: consumes pending presses and latches gamepad
    /// buttons. Calling it twice in one frame loses the second call's edges.
    pub fn snapshot(&mut self) -> InputSnapshot {
        let pad = GamepadState::from_raw(self.gamepads.first_connected().as_ref());
        let snapshot = self.derive(pad);
        self.prev_gamepad = pad;
        self.pressed.clear();
        snapshot
    }

    /// Read-only variant of [`Self::snapshot`] for overlays and tooling.
    pub fn debug_snapshot(&self) -> InputSnapshot {
        let pad = GamepadState::from_raw(self.gamepads.first_connected().as_ref());
        self.derive(pad)
    }

    fn derive(&self, pad: GamepadState) -> InputSnapshot {
        let mut actions = ActionSet::from_keys(&self.held, &self.pressed);

        let left_held = pad.axis_x < -GAMEPAD_HOLD_THRESHOLD;
        let right_held = pad.axis_x > GAMEPAD_HOLD_THRESHOLD;
        let jump_pressed = pad.jump && !self.prev_gamepad.jump;
        let dash_pressed = pad.dash && !self.prev_gamepad.dash;
        let attack_pressed = pad.attack && !self.prev_gamepad.attack;

        // Stick contributes to held only; edges come from buttons.
        actions.get_mut(Action::Left).held |= left_held;
        actions.get_mut(Action::Right).held |= right_held;

        for (action, down, edge) in [
            (Action::Jump, pad.jump, jump_pressed),
            (Action::Dash, pad.dash, dash_pressed),
            (Action::Attack, pad.attack, attack_pressed),
        ] {
            let state = actions.get_mut(action);
            state.held |= down;
            state.pressed |= edge;
        }

        InputSnapshot {
            actions,
            gamepad: GamepadSnapshot {
                state: pad,
                left_held,
                right_held,
                jump_pressed,
                dash_pressed,
                attack_pressed,
            },
            held_keys: self.held.iter().copied().collect(),
        }
    }
}

impl Default for InputController {
    fn default() -> Self {
        Self::new()
    }
}
