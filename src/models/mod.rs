mod progress;
mod step_table;

pub use {
    progress::{
        ProgressResult, RouteView, StepState, StepView, compute_progress, compute_progress_with,
        fractional_advance, progress_ratio,
    },
    step_table::{
        IconRule, LocationRule, STEPS, StepDefinition, StepIcon, resolve_step_index,
    },
};
