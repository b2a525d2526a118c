pub mod checkpoint;
pub mod config;
pub mod early_stopping;
pub mod history;
pub mod plot;
pub mod progress;
pub mod signal;
pub mod trainer;

pub use checkpoint::{read_checkpoint_info, CheckpointInfo, CheckpointManager};
pub use config::{ProgressMode, StepPlan, TrainingConfig};
pub use early_stopping::{EarlyStopRule, EarlyStopping};
pub use history::{EpochHistory, EpochSummary, PhaseMetrics};
pub use plot::plot_history;
pub use progress::{render_bar, BarProgress, NoProgress, ProgressReporter, TextProgress};
pub use signal::StopSignal;
pub use trainer::{progress_for, EpochOutcome, Trainer, TrainingReport, TrainingState};
