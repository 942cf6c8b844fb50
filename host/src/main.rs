#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
mod cli;
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
mod events;

#[cfg(target_os = "linux")]
use anyhow::{anyhow, Context, Result};
#[cfg(target_os = "linux")]
use aya::{
    include_bytes_aligned,
    maps::{
        perf::{AsyncPerfEventArray, Events},
        Array,
    },
    programs::{tc, tc::SchedClassifierLinkId, SchedClassifier, TcAttachType},
    util::online_cpus,
    Ebpf,
};
#[cfg(target_os = "linux")]
use aya_log::EbpfLogger;
#[cfg(target_os = "linux")]
use bytes::BytesMut;
#[cfg(target_os = "linux")]
use clap::Parser;
#[cfg(target_os = "linux")]
use tc_inspect_common::{InspectConfig, PayloadEvent};
#[cfg(target_os = "linux")]
use tracing_subscriber::EnvFilter;

#[cfg(target_os = "linux")]
const BPF_OBJECT: &[u8] = include_bytes_aligned!(concat!(env!("OUT_DIR"), "/tc-inspect-ebpf"));

#[cfg(target_os = "linux")]
const HOOKS: [(&str, TcAttachType); 2] = [
    ("tc_ingress", TcAttachType::Ingress),
    ("tc_egress", TcAttachType::Egress),
];

#[cfg(target_os = "linux")]
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let args = cli::Args::parse();
    let config = args.config().context("invalid inspection settings")?;

    let mut bpf = Ebpf::load(BPF_OBJECT)?;
    if let Err(e) = EbpfLogger::init(&mut bpf) {
        tracing::warn!(error = ?e, "failed to initialize eBPF logger");
    }

    let mut config_map: Array<_, InspectConfig> = Array::try_from(
        bpf.map_mut("CONFIG")
            .ok_or_else(|| anyhow!("CONFIG map not found"))?,
    )?;
    config_map
        .set(0, config, 0)
        .context("failed to write inspection config")?;

    // Fails when the interface already has a clsact qdisc, which is fine.
    if let Err(e) = tc::qdisc_add_clsact(&args.iface) {
        tracing::debug!(error = %e, "clsact qdisc not added");
    }

    let mut links: Vec<(&str, SchedClassifierLinkId)> = Vec::with_capacity(HOOKS.len());
    for (name, attach_type) in HOOKS {
        let program = classifier(&mut bpf, name)?;
        program.load()?;
        let link_id = program
            .attach(&args.iface, attach_type)
            .with_context(|| format!("failed to attach '{name}' to {}", args.iface))?;
        links.push((name, link_id));
    }

    let map = bpf
        .take_map("EVENTS")
        .ok_or_else(|| anyhow!("EVENTS map not found"))?;
    let mut perf_array = AsyncPerfEventArray::try_from(map)?;

    let cpus = online_cpus().map_err(|(msg, err)| anyhow!("{msg}: {err}"))?;
    for cpu_id in cpus {
        let mut buf = perf_array
            .open(cpu_id, None)
            .with_context(|| format!("failed to open perf buffer on CPU {cpu_id}"))?;

        tokio::spawn(async move {
            let mut buffers = (0..16)
                .map(|_| BytesMut::with_capacity(core::mem::size_of::<PayloadEvent>()))
                .collect::<Vec<_>>();

            loop {
                let Events { read, lost } = match buf.read_events(&mut buffers).await {
                    Ok(events) => events,
                    Err(e) => {
                        tracing::error!(error = ?e, "perf buffer read failure");
                        continue;
                    }
                };

                if lost > 0 {
                    tracing::warn!(lost, "perf buffer lost events");
                }

                for buffer in buffers.iter_mut().take(read) {
                    match events::decode(buffer) {
                        Some(event) => events::log_event(&event),
                        None => tracing::warn!(
                            len = buffer.len(),
                            expected = core::mem::size_of::<PayloadEvent>(),
                            "perf buffer returned undersized payload"
                        ),
                    }
                    buffer.clear();
                }
            }
        });
    }

    tracing::info!(
        iface = %args.iface,
        port = config.target_port,
        mode = config.mode().as_str(),
        "attached TC classifiers"
    );
    tokio::signal::ctrl_c()
        .await
        .context("failed while waiting for ctrl-c")?;

    tracing::info!("detaching and shutting down");
    // The clsact qdisc is left in place; it is empty once both filters are gone.
    for (name, link_id) in links {
        match classifier(&mut bpf, name).and_then(|program| Ok(program.detach(link_id)?)) {
            Ok(()) => tracing::debug!(program = name, "detached"),
            Err(e) => tracing::warn!(program = name, error = %e, "failed to detach"),
        }
    }

    Ok(())
}

#[cfg(target_os = "linux")]
fn classifier<'a>(bpf: &'a mut Ebpf, name: &str) -> Result<&'a mut SchedClassifier> {
    bpf.program_mut(name)
        .with_context(|| format!("failed to find classifier '{name}'"))?
        .try_into()
        .with_context(|| format!("program '{name}' is not a classifier"))
}

#[cfg(not(target_os = "linux"))]
fn main() {
    eprintln!("tc-inspect-host currently supports Linux only.");
}
