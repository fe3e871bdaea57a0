//! Scene-stack runtime.
//!
//! A [`SceneManager`] drives an ordered stack of [`Scene`]s with one shared
//! input controller, one entity store and a fixed-timestep clock:
//!
//!   1. poll pending scene initializers, resolve the ones that finished
//!   2. `begin_frame()` measures the host delta and feeds the accumulator
//!   3. one snapshot of input per rendered frame
//!   4. `while should_step()`: `handle_input` on the top scene, `update` on every
//!      initialized scene bottom to top, then apply queued [`SceneCommand`]s
//!      (paused: exactly one such cycle with `dt = 0`, accumulator untouched)
//!   5. clear the canvas and render every initialized scene bottom to top
//!
//! Scenes never hold a reference to the manager. They talk back through
//! [`SharedContext::push_scene`] and friends, which queue commands applied at
//! the end of the current update cycle.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::task::{Context, Poll};

use brawl_render::Canvas;
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::EntityStore;
use crate::input::{InputController, InputSnapshot};
use crate::time::{TimeState, DEFAULT_FIXED_DT, DEFAULT_MAX_FRAME_DT};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("unknown scene id: {0}")]
    UnknownScene(String),
    #[error("invalid scene payload: {0}")]
    InvalidPayload(String),
}

/// Opaque value handed from whoever pushes a scene to that scene's factory.
#[derive(Default)]
pub struct ScenePayload(Option<Box<dyn Any>>);

impl ScenePayload {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn new<T: Any>(value: T) -> Self {
        Self(Some(Box::new(value)))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    pub fn take<T: Any>(self) -> Result<T, SceneError> {
        let boxed = self.0.ok_or_else(|| {
            SceneError::InvalidPayload(format!(
                "missing payload, expected {}",
                std::any::type_name::<T>()
            ))
        })?;
        boxed.downcast::<T>().map(|value| *value).map_err(|_| {
            SceneError::InvalidPayload(format!(
                "payload is not a {}",
                std::any::type_name::<T>()
            ))
        })
    }

    /// Like [`Self::take`], but an empty payload yields `T::default()`.
    pub fn take_or_default<T: Any + Default>(self) -> Result<T, SceneError> {
        if self.is_empty() {
            Ok(T::default())
        } else {
            self.take()
        }
    }
}

impl std::fmt::Debug for ScenePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(_) => f.write_str("ScenePayload(..)"),
            None => f.write_str("ScenePayload(None)"),
        }
    }
}

/// Result of [`Scene::initialize`].
pub enum Initialization {
    Ready,
    Failed(String),
    /// Resolved by polling at the start of later frames.
    Pending(LocalBoxFuture<'static, Result<(), String>>),
}

/// Stack change requested by a scene, applied by the manager.
#[derive(Debug)]
pub enum SceneCommand {
    Push { id: String, payload: ScenePayload },
    Replace { id: String, payload: ScenePayload },
    Pop,
    Remove(String),
    SetPaused(bool),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    /// Floor plane in canvas pixels (+y down).
    pub floor: f32,
    #[serde(default)]
    pub stage: Option<String>,
}

/// Read-only view of one stack slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackEntry {
    pub index: usize,
    pub id: String,
    pub metadata: serde_json::Value,
    pub initialized: bool,
}

/// State shared with every scene callback.
pub struct SharedContext<E> {
    pub width: f32,
    pub height: f32,
    pub environment: Environment,
    pub entities: EntityStore<E>,
    stack: Vec<StackEntry>,
    commands: Vec<SceneCommand>,
}

impl<E> SharedContext<E> {
    /// The stack as of the start of the current update cycle.
    pub fn stack(&self) -> &[StackEntry] {
        &self.stack
    }

    pub fn queue(&mut self, command: SceneCommand) {
        self.commands.push(command);
    }

    pub fn push_scene(&mut self, id: &str, payload: ScenePayload) {
        self.queue(SceneCommand::Push {
            id: id.to_string(),
            payload,
        });
    }

    pub fn pop_scene(&mut self) {
        self.queue(SceneCommand::Pop);
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.queue(SceneCommand::SetPaused(paused));
    }
}

/// A screen (or overlay) on the stack. Every hook is optional.
pub trait Scene<E> {
    fn id(&self) -> &str;

    fn metadata(&self) -> serde_json::Value {
        serde_json::Value::Null
    }

    fn initialize(&mut self, _shared: &mut SharedContext<E>) -> Initialization {
        Initialization::Ready
    }

    fn on_enter(&mut self, _shared: &mut SharedContext<E>) {}

    fn on_exit(&mut self, _shared: &mut SharedContext<E>) {}

    /// Only called on the top of the stack.
    fn handle_input(&mut self, _input: &InputSnapshot, _shared: &mut SharedContext<E>) {}

    fn update(&mut self, _dt: f32, _input: &InputSnapshot, _shared: &mut SharedContext<E>) {}

    fn render(&self, _canvas: &mut dyn Canvas, _shared: &SharedContext<E>) {}
}

pub type SceneFactory<E> = Box<dyn Fn(ScenePayload) -> Result<Box<dyn Scene<E>>, SceneError>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    pub width: f32,
    pub height: f32,
    pub fixed_dt: f64,
    pub max_frame_dt: f64,
    /// Distance of the floor plane from the bottom edge.
    pub floor_offset: f32,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            width: 960.0,
            height: 420.0,
            fixed_dt: DEFAULT_FIXED_DT,
            max_frame_dt: DEFAULT_MAX_FRAME_DT,
            floor_offset: 60.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Stopped,
    Running,
    Paused,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimingSnapshot {
    pub fps: f64,
    pub frame_time_ms: f64,
    pub frames: u64,
    pub fixed_steps: u64,
    pub steps_this_frame: u32,
    pub interpolation_alpha: f64,
}

/// Everything a developer overlay shows. Taking it has no side effects on
/// input or simulation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugSnapshot {
    pub state: RunState,
    pub environment: Environment,
    pub stack: Vec<StackEntry>,
    pub entity_totals: BTreeMap<String, usize>,
    pub entity_count: usize,
    pub input: InputSnapshot,
    pub timing: TimingSnapshot,
}

struct StackSlot<E> {
    scene: Box<dyn Scene<E>>,
    pending: Option<LocalBoxFuture<'static, Result<(), String>>>,
    initialized: bool,
}

pub struct SceneManager<E> {
    registry: HashMap<String, SceneFactory<E>>,
    stack: Vec<StackSlot<E>>,
    stack_dirty: bool,
    shared: SharedContext<E>,
    input: InputController,
    time: TimeState,
    running: bool,
    paused: bool,
    carried_input: Option<InputSnapshot>,
}

impl<E> SceneManager<E> {
    /// `entities` should already have its types registered; the manager only
    /// ever clears records, never the type registry.
    pub fn new(config: ManagerConfig, entities: EntityStore<E>) -> Self {
        let shared = SharedContext {
            width: config.width,
            height: config.height,
            environment: Environment {
                floor: config.height - config.floor_offset,
                stage: None,
            },
            entities,
            stack: Vec::new(),
            commands: Vec::new(),
        };
        Self {
            time: TimeState::new(config.fixed_dt, config.max_frame_dt),
            registry: HashMap::new(),
            stack: Vec::new(),
            stack_dirty: true,
            shared,
            input: InputController::new(),
            running: false,
            paused: false,
            carried_input: None,
        }
    }

    pub fn register(
        &mut self,
        id: &str,
        factory: impl Fn(ScenePayload) -> Result<Box<dyn Scene<E>>, SceneError> + 'static,
    ) {
        if self.registry.insert(id.to_string(), Box::new(factory)).is_some() {
            log::debug!("Scene factory '{id}' replaced");
        }
    }

    /// Host-facing: forward key events here. A host with gamepads swaps in
    /// an [`InputController::with_gamepads`] before `start`.
    pub fn input_mut(&mut self) -> &mut InputController {
        &mut self.input
    }

    pub fn entities(&self) -> &EntityStore<E> {
        &self.shared.entities
    }

    pub fn state(&self) -> RunState {
        match (self.running, self.paused) {
            (false, _) => RunState::Stopped,
            (true, false) => RunState::Running,
            (true, true) => RunState::Paused,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        if self.paused != paused {
            log::info!("Scene manager {}", if paused { "paused" } else { "resumed" });
        }
        self.paused = paused;
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn top_id(&self) -> Option<&str> {
        self.stack.last().map(|slot| slot.scene.id())
    }

    /// Stops any previous run, resets timing, clears the entity store,
    /// attaches input and pushes `initial`.
    pub fn start(&mut self, initial: &str, payload: ScenePayload) -> Result<(), SceneError> {
        self.stop();
        self.input.attach();
        self.time.reset();
        self.shared.entities.clear();
        self.shared.commands.clear();
        self.carried_input = None;
        self.running = true;
        self.paused = false;
        self.stack_dirty = true;
        log::info!("Scene manager started with '{initial}'");
        self.push(initial, payload)
    }

    /// Detaches input, exits every scene top to bottom, clears the store.
    /// Safe to call when already stopped.
    pub fn stop(&mut self) {
        let was_running = self.running;
        self.running = false;
        self.paused = false;
        self.input.detach();
        while let Some(mut slot) = self.stack.pop() {
            self.stack_dirty = true;
            slot.scene.on_exit(&mut self.shared);
        }
        self.shared.entities.clear();
        self.shared.commands.clear();
        self.carried_input = None;
        if was_running {
            log::info!("Scene manager stopped");
        }
    }

    pub fn push(&mut self, id: &str, payload: ScenePayload) -> Result<(), SceneError> {
        let scene = self.build(id, payload)?;
        self.push_scene(scene);
        Ok(())
    }

    /// Swaps the top scene for a new `id`. The old top is only exited once
    /// the new scene was built successfully.
    pub fn replace(&mut self, id: &str, payload: ScenePayload) -> Result<(), SceneError> {
        let scene = self.build(id, payload)?;
        if let Some(mut old) = self.stack.pop() {
            self.stack_dirty = true;
            log::info!("Scene replace: '{}' -> '{id}'", old.scene.id());
            old.scene.on_exit(&mut self.shared);
        }
        self.push_scene(scene);
        Ok(())
    }

    /// Pops the top scene and returns its id.
    pub fn pop(&mut self) -> Option<String> {
        let mut slot = self.stack.pop()?;
        self.stack_dirty = true;
        let id = slot.scene.id().to_string();
        log::info!("Scene pop: '{id}' stack={:?}", self.stack_ids());
        slot.scene.on_exit(&mut self.shared);
        Some(id)
    }

    /// Removes the topmost scene with `id`, wherever it sits in the stack.
    pub fn remove_by_id(&mut self, id: &str) -> bool {
        let Some(index) = self.stack.iter().rposition(|slot| slot.scene.id() == id) else {
            log::debug!("Scene remove: '{id}' not on the stack");
            return false;
        };
        let mut slot = self.stack.remove(index);
        self.stack_dirty = true;
        log::info!("Scene remove: '{id}' stack={:?}", self.stack_ids());
        slot.scene.on_exit(&mut self.shared);
        true
    }

    /// Cached view of the stack, rebuilt only after a stack change.
    pub fn stack_snapshot(&mut self) -> &[StackEntry] {
        self.refresh_stack_snapshot();
        &self.shared.stack
    }

    pub fn debug_snapshot(&mut self) -> DebugSnapshot {
        let stack = self.stack_snapshot().to_vec();
        DebugSnapshot {
            state: self.state(),
            environment: self.shared.environment.clone(),
            stack,
            entity_totals: self.shared.entities.count_by_type(),
            entity_count: self.shared.entities.len(),
            input: self.input.debug_snapshot(),
            timing: TimingSnapshot {
                fps: self.time.smoothed_fps,
                frame_time_ms: self.time.smoothed_frame_time_ms,
                frames: self.time.frame_count,
                fixed_steps: self.time.fixed_step_count,
                steps_this_frame: self.time.steps_this_frame,
                interpolation_alpha: self.time.interpolation_alpha,
            },
        }
    }

    /// Host per-frame callback. Returns whether another frame should be
    /// scheduled.
    pub fn frame(&mut self, timestamp_ms: f64, canvas: Option<&mut dyn Canvas>) -> bool {
        if !self.running {
            return false;
        }

        self.resolve_pending();
        self.time.begin_frame(timestamp_ms, self.paused);

        let mut input = self.input.snapshot();
        if let Some(carried) = self.carried_input.take() {
            input.merge_edges_from(&carried);
        }

        if self.paused {
            self.run_cycle(0.0, &input);
        } else {
            let dt = self.time.fixed_dt as f32;
            let mut delivered = false;
            while self.running && !self.paused && self.time.should_step() {
                // Press edges belong to the first step of the frame only.
                if delivered {
                    let held_only = input.without_edges();
                    self.run_cycle(dt, &held_only);
                } else {
                    self.run_cycle(dt, &input);
                    delivered = true;
                }
            }
            if !delivered && input.has_edges() {
                self.carried_input = Some(input);
            }
        }
        self.time.end_frame();

        if let Some(canvas) = canvas {
            self.render(canvas);
        }
        self.running
    }

    /// Clears `canvas` and draws every initialized scene bottom to top.
    pub fn render(&self, canvas: &mut dyn Canvas) {
        canvas.clear();
        for slot in self.stack.iter().filter(|slot| slot.initialized) {
            slot.scene.render(canvas, &self.shared);
        }
    }

    fn build(&self, id: &str, payload: ScenePayload) -> Result<Box<dyn Scene<E>>, SceneError> {
        let factory = self
            .registry
            .get(id)
            .ok_or_else(|| SceneError::UnknownScene(id.to_string()))?;
        factory(payload)
    }

    fn push_scene(&mut self, scene: Box<dyn Scene<E>>) {
        self.stack.push(StackSlot {
            scene,
            pending: None,
            initialized: false,
        });
        self.stack_dirty = true;
        let index = self.stack.len() - 1;
        log::info!(
            "Scene push: '{}' stack={:?}",
            self.stack[index].scene.id(),
            self.stack_ids()
        );
        self.refresh_stack_snapshot();

        let slot = &mut self.stack[index];
        match slot.scene.initialize(&mut self.shared) {
            Initialization::Ready => {
                log::debug!("Scene '{}' initialized", slot.scene.id());
                Self::enter(slot, &mut self.shared);
            }
            Initialization::Failed(err) => {
                log::error!("Scene '{}' initialize failed: {err}", slot.scene.id());
                Self::enter(slot, &mut self.shared);
            }
            Initialization::Pending(future) => {
                log::debug!("Scene '{}' initializing asynchronously", slot.scene.id());
                slot.pending = Some(future);
            }
        }
        self.stack_dirty = true;
    }

    fn enter(slot: &mut StackSlot<E>, shared: &mut SharedContext<E>) {
        slot.pending = None;
        slot.initialized = true;
        slot.scene.on_enter(shared);
    }

    fn resolve_pending(&mut self) {
        let mut cx = Context::from_waker(futures::task::noop_waker_ref());
        for slot in self.stack.iter_mut() {
            let Some(future) = slot.pending.as_mut() else {
                continue;
            };
            match future.poll_unpin(&mut cx) {
                Poll::Pending => {}
                Poll::Ready(Ok(())) => {
                    log::info!("Scene '{}' initialized (async)", slot.scene.id());
                    Self::enter(slot, &mut self.shared);
                    self.stack_dirty = true;
                }
                Poll::Ready(Err(err)) => {
                    log::error!("Scene '{}' initialize failed: {err}", slot.scene.id());
                    Self::enter(slot, &mut self.shared);
                    self.stack_dirty = true;
                }
            }
        }
    }

    fn run_cycle(&mut self, dt: f32, input: &InputSnapshot) {
        self.refresh_stack_snapshot();
        if let Some(top) = self.stack.last_mut().filter(|slot| slot.initialized) {
            top.scene.handle_input(input, &mut self.shared);
        }
        for slot in self.stack.iter_mut().filter(|slot| slot.initialized) {
            slot.scene.update(dt, input, &mut self.shared);
        }
        self.apply_commands();
    }

    fn apply_commands(&mut self) {
        // Scenes entered while applying may queue further commands.
        while !self.shared.commands.is_empty() {
            let commands = std::mem::take(&mut self.shared.commands);
            for command in commands {
                let result = match command {
                    SceneCommand::Push { id, payload } => self.push(&id, payload),
                    SceneCommand::Replace { id, payload } => self.replace(&id, payload),
                    SceneCommand::Pop => {
                        self.pop();
                        Ok(())
                    }
                    SceneCommand::Remove(id) => {
                        self.remove_by_id(&id);
                        Ok(())
                    }
                    SceneCommand::SetPaused(paused) => {
                        self.set_paused(paused);
                        Ok(())
                    }
                };
                if let Err(err) = result {
                    log::error!("Scene command failed: {err}");
                }
            }
        }
    }

    fn stack_ids(&self) -> Vec<&str> {
        self.stack.iter().map(|slot| slot.scene.id()).collect()
    }

    fn refresh_stack_snapshot(&mut self) {
        if !self.stack_dirty {
            return;
        }
        self.shared.stack = self
            .stack
            .iter()
            .enumerate()
            .map(|(index, slot)| StackEntry {
                index,
                id: slot.scene.id().to_string(),
                metadata: slot.scene.metadata(),
                initialized: slot.initialized,
            })
            .collect();
        self.stack_dirty = false;
    }
}
