// Domain chat router: a stateless HTTP relay in front of two text-generation
// backends (a self-hosted fine-tuned endpoint and the OpenAI chat completions
// API), plus the terminal chat client that drives it.

pub mod client;
pub mod web;
