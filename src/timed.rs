/// Run `$closure`, logging at debug level how long it took.
#[macro_export]
macro_rules! timed {
    ($msg:expr, $($args:expr),+; $closure:expr) => {{
        let msg = format!($msg, $($args),+);

        let start_time = std::time::Instant::now();
        log::debug!("Start: {}", msg);

        let out = $closure();

        log::debug!("End:   {}: {:?}", msg, start_time.elapsed());

        out
    }};
    ($msg:expr; $closure:expr) => {{
        let msg: &str = $msg;

        let start_time = std::time::Instant::now();
        log::debug!("Start: {}", msg);

        let out = $closure();

        log::debug!("End:   {}: {:?}", msg, start_time.elapsed());

        out
    }};
}
