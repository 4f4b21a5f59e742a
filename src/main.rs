use std::{env, process};

use rand::thread_rng;
use rwsum::{config::MIN_TASKS, output, Config, Error, Partition, Policy, Result, Session};

fn main()
{
    output::init();

    if let Err(err) = run() {
        output::error(&err);
        process::exit(1);
    }
}

fn run() -> Result<()>
{
    let config = Config::from_args(env::args())?.with_policy_env()?;
    if config.policy != Policy::default() {
        eprintln!("{}", output::policy_note(&config.policy));
    }

    let partition = Partition::random(config.tasks, &mut thread_rng()).ok_or(Error::TooFewTasks {
        requested: config.tasks,
        minimum: MIN_TASKS,
    })?;

    let mut session = Session::open(&config)?;
    let summary = session.run(partition)?;

    println!("{}", summary);
    Ok(())
}
