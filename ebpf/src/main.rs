#![cfg_attr(target_arch = "bpf", no_std)]
#![cfg_attr(target_arch = "bpf", no_main)]

#[cfg(not(target_arch = "bpf"))]
fn main() {}

#[cfg(target_arch = "bpf")]
use aya_ebpf::{
    bindings::{TC_ACT_OK, TC_ACT_SHOT},
    helpers::bpf_skb_store_bytes,
    macros::{classifier, map},
    maps::{Array, PerfEventArray},
    programs::TcContext,
};
#[cfg(target_arch = "bpf")]
use aya_log_ebpf::{debug, trace};
#[cfg(target_arch = "bpf")]
use tc_inspect_common::{
    view::check_bounds, Direction, EmitError, EventSink, InspectConfig, Inspector, Outcome,
    PacketView, PayloadEvent, Verdict, ViewError,
};

#[cfg(target_arch = "bpf")]
#[map(name = "EVENTS")]
static mut EVENTS: PerfEventArray<PayloadEvent> = PerfEventArray::new(0);

/// Written once by the loader; slot 0 holds the active configuration.
#[cfg(target_arch = "bpf")]
#[map(name = "CONFIG")]
static mut CONFIG: Array<InspectConfig> = Array::with_max_entries(1, 0);

#[cfg(target_arch = "bpf")]
#[classifier]
pub fn tc_ingress(ctx: TcContext) -> i32 {
    handle(ctx, Direction::Ingress)
}

#[cfg(target_arch = "bpf")]
#[classifier]
pub fn tc_egress(ctx: TcContext) -> i32 {
    handle(ctx, Direction::Egress)
}

#[cfg(target_arch = "bpf")]
#[allow(static_mut_refs)]
fn handle(mut ctx: TcContext, direction: Direction) -> i32 {
    let config = unsafe { CONFIG.get(0) }
        .copied()
        .unwrap_or(InspectConfig::REFERENCE);
    let sink = PerfSink {
        ctx: TcContext::new(ctx.skb.skb),
    };
    let mut inspector = Inspector::new(config, sink);

    let outcome = inspector.run(&mut SkbView { ctx: &mut ctx }, direction);
    match outcome {
        Outcome::Inspected(inspection) => debug!(
            &ctx,
            "{}: verdict={} payload_len={} match={} rewritten={}",
            direction.as_str(),
            (inspection.verdict == Verdict::Drop) as u8,
            inspection.payload_len,
            inspection.matched_at.map_or(-1, |offset| offset as i32),
            inspection.rewritten as u8,
        ),
        Outcome::Skipped(rejection) => trace!(
            &ctx,
            "{}: skipped: {}",
            direction.as_str(),
            rejection.as_str(),
        ),
    }

    match outcome.verdict() {
        Verdict::Pass => TC_ACT_OK,
        Verdict::Drop => TC_ACT_SHOT,
    }
}

/// [`PacketView`] over the socket buffer, including its non-linear part.
#[cfg(target_arch = "bpf")]
struct SkbView<'a> {
    ctx: &'a mut TcContext,
}

#[cfg(target_arch = "bpf")]
impl PacketView for SkbView<'_> {
    fn len(&self) -> usize {
        self.ctx.len() as usize
    }

    fn load(&self, offset: usize, dst: &mut [u8]) -> Result<(), ViewError> {
        let len = self.len();
        check_bounds(offset, dst.len(), len)?;
        if dst.is_empty() {
            return Ok(());
        }
        let width = dst.len();
        match self.ctx.load_bytes(offset, dst) {
            Ok(copied) if copied == width => Ok(()),
            _ => Err(ViewError::OutOfBounds { offset, width, len }),
        }
    }

    fn store(&mut self, offset: usize, src: &[u8]) -> Result<(), ViewError> {
        let len = self.len();
        check_bounds(offset, src.len(), len)?;
        if src.is_empty() {
            return Ok(());
        }
        let ret = unsafe {
            bpf_skb_store_bytes(
                self.ctx.skb.skb as *mut _,
                offset as u32,
                src.as_ptr() as *const _,
                src.len() as u32,
                0,
            )
        };
        if ret < 0 {
            return Err(ViewError::OutOfBounds {
                offset,
                width: src.len(),
                len,
            });
        }
        Ok(())
    }
}

/// `PerfEventArray::output` does not report failure; records the kernel
/// could not deliver show up in the reader's `lost` count instead.
#[cfg(target_arch = "bpf")]
struct PerfSink {
    ctx: TcContext,
}

#[cfg(target_arch = "bpf")]
impl EventSink for PerfSink {
    #[allow(static_mut_refs)]
    fn emit(&mut self, event: &PayloadEvent) -> Result<(), EmitError> {
        unsafe {
            EVENTS.output(&self.ctx, event, 0);
        }
        Ok(())
    }
}

#[cfg(target_arch = "bpf")]
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    loop {
        core::hint::spin_loop();
    }
}
