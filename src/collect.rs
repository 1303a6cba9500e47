//! Per-endpoint collection.
//!
//! Every endpoint is read on its own thread. A thread shares nothing with
//! its siblings; it returns what it gathered and the results are merged on
//! the calling thread, in endpoint order. An endpoint that fails, or whose
//! thread panics, is logged and contributes nothing.

use source::Error;
use std::sync::Arc;
use std::thread;

/// Run `collector` against every endpoint in parallel and concatenate the
/// results in endpoint order.
pub fn gather<T, F>(endpoints: &[String], collector: F) -> Vec<T>
where
    T: Send + 'static,
    F: Fn(&str) -> Result<Vec<T>, Error> + Send + Sync + 'static,
{
    let collector = Arc::new(collector);
    let mut workers = Vec::with_capacity(endpoints.len());
    for endpoint in endpoints {
        let collector = Arc::clone(&collector);
        let name = endpoint.clone();
        let spawned = thread::Builder::new()
            .name(format!("collect-{}", endpoint))
            .spawn(move || collector(&name));
        match spawned {
            Ok(handle) => workers.push((endpoint.as_str(), Some(handle))),
            Err(e) => {
                error!("could not start collection thread for {}: {}", endpoint, e);
                workers.push((endpoint.as_str(), None));
            }
        }
    }

    let mut merged = Vec::new();
    for (endpoint, worker) in workers {
        let handle = match worker {
            Some(handle) => handle,
            None => continue,
        };
        match handle.join() {
            Ok(Ok(items)) => {
                info!("collected {} records from {}", items.len(), endpoint);
                merged.extend(items);
            }
            Ok(Err(e)) => error!("unable to collect from {}: {}", endpoint, e),
            Err(_) => error!("collection thread for {} panicked", endpoint),
        }
    }
    merged
}
