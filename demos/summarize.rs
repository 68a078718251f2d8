//! Summarize the functions of a source tree, one model call per function.
//!
//! Point it at any OpenAI-compatible endpoint:
//!
//!   CODELINE_LLM_URL=http://localhost:11434/v1 \
//!   CODELINE_LLM_MODEL=llama3.2 \
//!   cargo run --example summarize -- path/to/tree
//!
//! CODELINE_LLM_KEY is sent as a bearer token when set.

use codeline::llm::LlmClient;
use codeline::summarize::{SummarizeJob, SummarizeOpts, summarize_pipeline};
use codeline::{Ctx, Runner};

fn main() {
    env_logger::init();

    let Ok(url) = std::env::var("CODELINE_LLM_URL") else {
        eprintln!("set CODELINE_LLM_URL to an OpenAI-compatible API base URL");
        std::process::exit(1);
    };
    let model = std::env::var("CODELINE_LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());

    let mut client = LlmClient::new(url, model);
    if let Ok(key) = std::env::var("CODELINE_LLM_KEY") {
        client = client.with_api_key(key);
    }

    let root = std::env::args().nth(1).unwrap_or_else(|| ".".into());
    let job = SummarizeJob::new(SummarizeOpts::new(root));

    let pipeline = summarize_pipeline().unwrap();
    let mut ctx = Ctx::with_model(client);

    let job = Runner::new(pipeline)
        .with_tracing()
        .run(job, &mut ctx)
        .unwrap();

    println!("{}", job.report);
}
