//! Ringlead Visualization
//!
//! Replay and comparison tooling on top of the election trace.
//!
//! # Architecture
//!
//! - **Timeline**: one recorded election, exportable as JSON
//! - **Playback**: scrub through a timeline and rebuild the ring at any step
//! - **Experiment**: seeded random rings, both variants on the same layout
//!
//! # Usage
//!
//! ```
//! use ringlead_election::Algorithm;
//! use ringlead_vis::{Experiment, ExperimentConfig};
//!
//! let experiment = Experiment::new(&ExperimentConfig::default())?;
//! let run = experiment.run(Algorithm::Optimized)?;
//!
//! let mut playback = run.timeline.playback();
//! playback.seek(run.timeline.len() / 2);
//! let halfway = playback.snapshot();
//! assert_eq!(halfway.nodes.len(), 10);
//! # Ok::<(), ringlead_vis::Error>(())
//! ```

mod error;
mod experiment;
mod playback;
mod timeline;

pub use error::{Error, Result};
pub use experiment::{pick_originators, random_ring, Comparison, Experiment, ExperimentConfig, Run};
pub use playback::{Playback, PlaybackState, PlaybackStatus};
pub use timeline::Timeline;
