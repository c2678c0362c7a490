//! Event types and sinks for observing damage renders.
//!
//! [`render_damage_with_events`](crate::damage::pipeline::render_damage_with_events)
//! reports its progress as [`PipelineEvent`]s. Sinks can opt out of event kinds
//! through [`EventSink::wants`] so the pipeline skips building events nobody reads.
use crate::damage::params::DamageLevel;
use crate::damage::pipeline::Stage;

/// Describes events emitted while rendering damage.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// Emitted once before any stage runs.
    RunStarted {
        /// Base image (width, height) in pixels.
        size: (u32, u32),
        level: DamageLevel,
        seed: u32,
    },

    /// Emitted when a stage begins doing work.
    StageStarted { stage: Stage },

    /// Emitted instead of `StageStarted` when a stage has nothing to do.
    StageSkipped {
        stage: Stage,
        /// Human-readable reason, e.g. "disabled".
        reason: String,
    },

    /// Emitted when a stage completes.
    StageFinished {
        stage: Stage,
        /// Cells punched for the hole stage, stamps drawn for decal stages.
        items: usize,
    },

    /// Non-fatal warning generated during the render.
    Warning {
        /// Context string (e.g. stage name, asset key).
        context: String,
        /// Human-readable message.
        message: String,
    },

    /// Emitted after the cover overlay, with the final tallies.
    RunFinished {
        holes_punched: usize,
        shrapnel_stamps: usize,
        scorch_stamps: usize,
    },
}

/// Discriminant of a [`PipelineEvent`], used for sink filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineEventKind {
    RunStarted,
    StageStarted,
    StageSkipped,
    StageFinished,
    Warning,
    RunFinished,
}

impl PipelineEvent {
    pub fn kind(&self) -> PipelineEventKind {
        match self {
            PipelineEvent::RunStarted { .. } => PipelineEventKind::RunStarted,
            PipelineEvent::StageStarted { .. } => PipelineEventKind::StageStarted,
            PipelineEvent::StageSkipped { .. } => PipelineEventKind::StageSkipped,
            PipelineEvent::StageFinished { .. } => PipelineEventKind::StageFinished,
            PipelineEvent::Warning { .. } => PipelineEventKind::Warning,
            PipelineEvent::RunFinished { .. } => PipelineEventKind::RunFinished,
        }
    }
}

/// A generic event sink that accepts [`PipelineEvent`]s.
pub trait EventSink {
    fn send(&mut self, event: PipelineEvent);

    /// Whether this sink cares about events of `kind`. Defaults to `true`.
    #[inline]
    fn wants(&self, _kind: PipelineEventKind) -> bool {
        true
    }
}

/// A no-op event sink.
impl EventSink for () {
    #[inline]
    fn send(&mut self, _event: PipelineEvent) {}

    #[inline]
    fn wants(&self, _kind: PipelineEventKind) -> bool {
        false
    }
}

/// An event sink that forwards to a user-provided closure.
pub struct FnSink<F>
where
    F: FnMut(PipelineEvent),
{
    f: F,
}

impl<F> FnSink<F>
where
    F: FnMut(PipelineEvent),
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EventSink for FnSink<F>
where
    F: FnMut(PipelineEvent),
{
    #[inline]
    fn send(&mut self, event: PipelineEvent) {
        (self.f)(event);
    }
}

/// An event sink that collects events in a `Vec`, optionally restricted to some kinds.
#[derive(Default)]
pub struct VecSink {
    events: Vec<PipelineEvent>,
    only: Option<Vec<PipelineEventKind>>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects only events whose kind is listed.
    pub fn only(kinds: impl IntoIterator<Item = PipelineEventKind>) -> Self {
        Self {
            events: Vec::new(),
            only: Some(kinds.into_iter().collect()),
        }
    }

    pub fn into_inner(self) -> Vec<PipelineEvent> {
        self.events
    }

    pub fn as_slice(&self) -> &[PipelineEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSink for VecSink {
    #[inline]
    fn send(&mut self, event: PipelineEvent) {
        if self.wants(event.kind()) {
            self.events.push(event);
        }
    }

    fn wants(&self, kind: PipelineEventKind) -> bool {
        self.only.as_ref().is_none_or(|kinds| kinds.contains(&kind))
    }
}

/// Fan-out sink that forwards each event to all contained sinks.
pub struct MultiSink<S: EventSink> {
    sinks: Vec<S>,
}

impl<S: EventSink> MultiSink<S> {
    pub fn with_sinks(sinks: Vec<S>) -> Self {
        Self { sinks }
    }

    pub fn into_inner(self) -> Vec<S> {
        self.sinks
    }
}

impl<S: EventSink> EventSink for MultiSink<S> {
    fn send(&mut self, event: PipelineEvent) {
        let kind = event.kind();
        let Some(last_idx) = self.sinks.iter().rposition(|s| s.wants(kind)) else {
            return;
        };
        for i in 0..last_idx {
            if self.sinks[i].wants(kind) {
                self.sinks[i].send(event.clone());
            }
        }
        self.sinks[last_idx].send(event);
    }

    fn wants(&self, kind: PipelineEventKind) -> bool {
        self.sinks.iter().any(|s| s.wants(kind))
    }
}
