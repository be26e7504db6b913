use watcher::runtime::{boot, serve};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    boot::init_logging();

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(async {
        let watcher = boot::boot()?;
        serve::serve(watcher).await
    });

    // A stdout write stalled on the blocking pool must not keep the process alive.
    runtime.shutdown_background();
    result
}
