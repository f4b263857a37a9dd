use crate::{queue::Ring, queue::SHUTDOWN, signal::SignalCore, KernelRecord, RuntimeCore, WaitState};
use common::{implicit_args_offset, packet_type, setup_dims, PacketRecord, PacketType};
use log::{trace, warn};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use std::sync::Arc;

/// 命令处理器主循环,随队列创建在独立线程上运行。
///
/// 门铃达到读索引后,自旋等待该槽头字发布;门铃先于头字可见是
/// 协议允许的,因为发布头字的 release 存储不约束其后的门铃写。
pub(crate) fn run(runtime: Arc<RuntimeCore>, ring: Arc<Ring>, doorbell: Arc<SignalCore>) {
    let mut read = 0u64;
    loop {
        let rung = doorbell.wait_until(WaitState::Blocked, |value| {
            value == SHUTDOWN || value >= read as i64
        });
        if rung == SHUTDOWN {
            break;
        }

        let packet = &ring.slots[ring.index.slot(read)];
        let head = loop {
            let head = packet.header_acquire();
            if packet_type(head) != PacketType::Invalid as u32 {
                break head;
            }
            std::hint::spin_loop();
        };

        if packet_type(head) == PacketType::KernelDispatch as u32 {
            let record = unsafe { packet.record().read() };
            trace!(
                "packet {read}: dims={} grid={:?} workgroup={:?}",
                setup_dims(head),
                record.grid_size,
                record.workgroup_size,
            );
            execute(&runtime, &record);
            packet.retire();
            if record.completion_signal != 0 {
                match runtime.signal(record.completion_signal) {
                    Some(signal) => signal.subtract(1),
                    None => warn!("packet {read}: unknown completion signal"),
                }
            }
        } else {
            warn!("packet {read}: unsupported type {}", packet_type(head));
            packet.retire();
        }
        read += 1;
    }
}

fn execute(runtime: &RuntimeCore, record: &PacketRecord) {
    let Some(kernel) = runtime.kernel(record.kernel_object) else {
        warn!("unknown kernel object {:#x}", record.kernel_object);
        return;
    };
    let KernelRecord {
        func,
        explicit_args_size,
    } = kernel;

    let workgroup = record.workgroup_size.map(|x| x.max(1));
    let grid = record.grid_size.map(|x| x.max(1));
    let counts = [
        grid[0].div_ceil(workgroup[0] as u32),
        grid[1].div_ceil(workgroup[1] as u32),
        grid[2].div_ceil(workgroup[2] as u32),
    ];
    let kernarg = record.kernarg_address as usize;
    let implicit = if kernarg == 0 {
        0
    } else {
        kernarg + implicit_args_offset(explicit_args_size as usize)
    };

    // 整组执行,边界由内核自己检查;工作组间并行,组内顺序
    let total = counts.iter().map(|&c| c as usize).product::<usize>();
    (0..total).into_par_iter().for_each(|flat| {
        let workgroup_id = [
            (flat % counts[0] as usize) as u32,
            (flat / counts[0] as usize % counts[1] as usize) as u32,
            (flat / (counts[0] as usize * counts[1] as usize)) as u32,
        ];
        for z in 0..workgroup[2] {
            for y in 0..workgroup[1] {
                for x in 0..workgroup[0] {
                    let item = crate::isa::WorkItem {
                        workgroup_id,
                        workitem_id: [x, y, z],
                        workgroup_size: workgroup,
                        grid_size: grid,
                        kernarg: kernarg as *const u8,
                        implicit: implicit as *const u8,
                    };
                    unsafe { func(&item) }
                }
            }
        }
    });
}
