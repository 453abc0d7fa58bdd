#[path = "integration/check.rs"]
mod check;
#[path = "integration/engine.rs"]
mod engine;
