use std::{thread, time};

/// The log dispatcher used for test runs, not yet bound to an output.
///
/// Lines look like `[<unix time>][<target>][<level>][thread <name>] <message>`. Test runners
/// name their threads after the test, so this tells which test a wait log belongs to.
pub fn dispatcher(log_level: log::LevelFilter) -> fern::Dispatch {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}][{}][thread {}] {}",
                time::SystemTime::now()
                    .duration_since(time::UNIX_EPOCH)
                    .unwrap_or_else(|e| {
                        println!("Can't get time since epoch: '{}'. Using a dummy value.", e);
                        time::Duration::from_secs(0)
                    })
                    .as_secs(),
                record.target(),
                record.level(),
                thread::current().name().unwrap_or("unnamed"),
                message
            ))
        })
        .level(log_level)
}

/// Set up the global logger to print to stdout. Fails if a logger was already set.
pub fn setup_logger(log_level: log::LevelFilter) -> Result<(), fern::InitError> {
    dispatcher(log_level).chain(std::io::stdout()).apply()?;

    Ok(())
}
