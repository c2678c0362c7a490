//! Damage compositing: parameters, the hole and stamp passes, and the pipeline.
pub mod events;
pub mod holes;
pub mod params;
pub mod pipeline;
pub mod rim;
pub mod stamps;

pub use events::{EventSink, PipelineEvent, PipelineEventKind};
pub use params::{DamageLevel, DamageParams, DecalParams, HoleParams};
pub use pipeline::{render_damage, render_damage_with_events, DamageAssets, DamageRender, Stage};
