//! Observability for Parley: subscriber setup and the GenAI span
//! conventions every remote call is recorded under.

pub mod genai_attrs;
pub mod tracing_setup;
