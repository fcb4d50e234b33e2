use easycni::{dispatch, render_error, Adapter, SubnetPlugin};
use tracing::error;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() {
    // stdout belongs to the CNI result, so logs go to stderr
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);

    let mut adapter = match Adapter::new() {
        Ok(adapter) => adapter,
        Err(err) => {
            error!("CNI plugin error: {}", err);
            fail(&err.to_string());
        }
    };

    println!("{}", dispatch(&mut adapter, &SubnetPlugin));
}

/// Report an unrecoverable error in CNI format and exit 1
fn fail(msg: &str) -> ! {
    println!("{}", render_error(msg));
    std::process::exit(1);
}
