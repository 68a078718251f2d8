//! The smallest possible pipeline: two deterministic steps, no model.
//!
//! Run with: cargo run --example hello

use codeline::{Ctx, Outcome, Pipeline, Runner, Step, StepResult};

#[derive(Clone, Debug)]
struct Greeting {
    who: String,
    message: String,
}

struct Compose;
impl Step<Greeting> for Compose {
    fn name(&self) -> &'static str {
        "compose"
    }
    fn run(&mut self, mut state: Greeting, ctx: &mut Ctx) -> StepResult<Greeting> {
        state.message = format!("hello, {}", state.who);
        ctx.log("composed greeting");
        Ok((state, Outcome::Continue))
    }
}

struct Print;
impl Step<Greeting> for Print {
    fn name(&self) -> &'static str {
        "print"
    }
    fn run(&mut self, state: Greeting, _ctx: &mut Ctx) -> StepResult<Greeting> {
        println!("{}", state.message);
        Ok((state, Outcome::Done))
    }
}

fn main() {
    let pipeline = Pipeline::builder("hello")
        .register(Compose)
        .register(Print)
        .start_at("compose")
        .then("print")
        .build()
        .unwrap();

    let mut ctx = Ctx::new();
    let state = Greeting {
        who: "world".into(),
        message: String::new(),
    };

    Runner::new(pipeline)
        .with_tracing()
        .run(state, &mut ctx)
        .unwrap();
}
