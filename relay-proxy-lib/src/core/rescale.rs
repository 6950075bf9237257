use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::service::Service;

const RESCALE_MIN: u64 = 50;
const RESCALE_BOT: u64 = 100;

/// One rescale pass (§4.9): for every service with dynamic scaling enabled
/// and at least two routable back-ends, nudge priorities away from the mean
/// latency by one step when a back-end sits more than 3 standard deviations
/// from it.
pub fn run_rescale_pass(services: &[Arc<Service>]) {
    for service in services {
        if !service.dynamic_rescale {
            continue;
        }
        let routable: Vec<_> = service.backends.iter().filter(|b| b.is_routable()).collect();
        if routable.len() < 2 {
            continue;
        }

        let averages: Vec<f64> = routable
            .iter()
            .filter_map(|b| b.counters.lock().ok().map(|c| c.t_average))
            .collect();
        if averages.len() < 2 {
            continue;
        }
        let mean = averages.iter().sum::<f64>() / averages.len() as f64;
        // Sample standard deviation (n-1 denominator), not population variance.
        let variance = averages.iter().map(|a| (a - mean).powi(2)).sum::<f64>()
            / (averages.len() - 1) as f64;
        let delta = 3.0 * variance.sqrt();

        let mut tot_pri_delta = 0i64;
        for backend in &routable {
            let Ok(mut counters) = backend.counters.lock() else { continue };
            if counters.n_requests < RESCALE_MIN {
                continue;
            }
            let avg = counters.t_average;
            if avg < mean - delta {
                backend.priority.fetch_add(1, Ordering::Release);
                tot_pri_delta += 1;
                debug!(service = %service.name, backend = %backend.address, "rescale: raising priority");
            } else if avg > mean + delta && backend.priority() > 1 {
                backend.priority.fetch_sub(1, Ordering::Release);
                tot_pri_delta -= 1;
                debug!(service = %service.name, backend = %backend.address, "rescale: lowering priority");
            } else {
                continue;
            }
            while counters.n_requests > RESCALE_BOT {
                counters.t_requests /= 2.0;
                counters.n_requests /= 2;
            }
        }

        if tot_pri_delta != 0 {
            service.abs_pri.fetch_add(tot_pri_delta, Ordering::Release);
            service.recompute_tot_pri();
        }
    }
}

/// Runs the rescale loop until `shutdown` fires.
pub async fn run_rescale_loop(
    services: Arc<Vec<Arc<Service>>>,
    interval: Duration,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                run_rescale_pass(&services);
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}
