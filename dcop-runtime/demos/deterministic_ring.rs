/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

//! Deterministic Ring Example
//!
//! Passes a token around a ring of agents under the central mailer, first
//! without and then with random message delays, and prints the figures of
//! each run. Two runs with the same configuration always print the same
//! numbers.
//!
//! # Running This Example
//!
//! ```bash
//! cargo run --example deterministic_ring
//! RUST_LOG=dcop_runtime=debug cargo run --example deterministic_ring
//! ```
//!
//! The runtime configuration is read from `$XDG_CONFIG_HOME/dcop/config.toml`
//! when present.

use dcop_runtime::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

const RING_SIZE: usize = 5;
const HOPS: u32 = 40;

/// The token handed from one agent to the next.
#[dcop_message("TOKEN")]
struct Token {
    hops_left: u32,
}

fn build_ring(mailer: &mut CentralMailer) -> anyhow::Result<Vec<MailboxRef>> {
    let names: Vec<String> = (0..RING_SIZE).map(|i| format!("agent{i}")).collect();
    let mut queues = Vec::with_capacity(RING_SIZE);

    for (i, name) in names.iter().enumerate() {
        let queue = mailer.new_queue(name.as_str())?;
        let next = names[(i + 1) % RING_SIZE].clone();
        let first = i == 0;
        queue.lock().register_incoming_fn([Token::MESSAGE_TYPE], move |message, ctx| {
            if *message.msg_type() == lifecycle::START {
                if first {
                    ctx.send(next.as_str(), Message::typed(Token { hops_left: HOPS }))?;
                }
                return Ok(());
            }
            let token = message.decode::<Token>()?;
            // Pretend the agent checks a few constraints before passing on.
            ctx.charge(u64::from(token.hops_left % 4) + 1);
            if token.hops_left > 0 {
                ctx.send(
                    next.as_str(),
                    Message::typed(Token {
                        hops_left: token.hops_left - 1,
                    }),
                )?;
            }
            Ok(())
        })?;
        queues.push(queue);
    }
    Ok(queues)
}

fn run(label: &str, config: RuntimeConfig, print_topology: bool) -> anyhow::Result<()> {
    let mut mailer = CentralMailer::new(config);
    let queues = build_ring(&mut mailer)?;

    mailer.start_all()?;
    let outcome = mailer.execute(None)?;
    let report = outcome.report();

    println!("--- {label} ---");
    println!("outcome:      {}", if outcome.is_success() { "quiescent" } else { "timed out" });
    println!("deliveries:   {}", report.deliveries);
    println!("final time:   {:?}", report.final_time);
    println!("wall clock:   {:?}", report.elapsed);
    if outcome.pending() > 0 {
        println!("pending:      {}", outcome.pending());
    }

    let stats = mailer.message_stats();
    for (msg_type, type_stats) in stats.iter() {
        println!(
            "{:<12}  count={} bytes={} max={}",
            msg_type.as_str(),
            type_stats.count, type_stats.total_bytes, type_stats.max_bytes
        );
    }
    for queue in &queues {
        let mailbox = queue.lock();
        info!(agent = %mailbox.agent_id(), clock = ?mailbox.clock().now(), "Final agent clock");
    }

    if print_topology {
        let guards: Vec<_> = queues.iter().map(|queue| queue.lock()).collect();
        println!("{}", network_to_dot(guards.iter().map(|guard| &**guard)));
    }

    mailer.end();
    println!();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("dcop_runtime=info".parse()?))
        .init();

    let mut config = RuntimeConfig::load();
    config.mailbox.measure_messages = true;

    let mut undelayed = config.clone();
    undelayed.mailer.delay.enabled = false;
    run("no delays", undelayed, true)?;

    let mut delayed = config;
    delayed.mailer.delay = DelayConfig {
        enabled: true,
        lambda: 0.5,
        seed: 7,
    };
    run("random delays, seed 7", delayed.clone(), false)?;
    run("random delays, seed 7 again", delayed, false)?;
    Ok(())
}
