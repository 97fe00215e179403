use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` picks the filter (default `info`),
/// `LOG_FORMAT=json` switches to one JSON object per line.
///
/// Logs go to stderr so stdout stays free for `simulate`'s JSON lines.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));

    if let Err(err) =
        tracing::subscriber::set_global_default(build_subscriber(filter, json, std::io::stderr))
    {
        eprintln!("tracing already initialised: {err}");
        return;
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

fn build_subscriber<W>(filter: EnvFilter, json: bool, writer: W) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(writer);
    if json {
        Box::new(builder.json().with_current_span(true).finish())
    } else {
        Box::new(builder.compact().finish())
    }
}
