use crate::{kernargs::ArgBuffer, symbol::EntryPoint};
use common::{
    FenceScope, PacketRecord, PacketType, HEADER_ACQUIRE_FENCE_SCOPE, HEADER_BARRIER,
    HEADER_RELEASE_FENCE_SCOPE, HEADER_TYPE, PACKET_HEAD_BYTES, SETUP_DIMENSIONS,
};
use dev_virtual_gpu::{Queue, Signal};
use log::trace;
use std::{mem::size_of, ptr::write_bytes};

/// 头字 setup 字段的维数:只看网格尺寸,Y>1 记 2,Z>1 记 3。
/// 与隐式参数块的维数规则(网格×工作组之积)刻意不同,分歧保持原样。
pub(crate) fn header_dims(grid: [u32; 3]) -> u16 {
    let mut dims = 1;
    if grid[1] > 1 {
        dims = 2;
    }
    if grid[2] > 1 {
        dims = 3;
    }
    dims
}

/// 向命令队列发布一条调度记录。步骤次序即协议:
///
/// 1. 原子保留写索引,掩码得槽号;
/// 2. 清零槽内头字之外的字节,填充全部非头字段;
/// 3. 由网格尺寸计算 setup 维数;
/// 4. 组装 32 位头字:类型、栅栏位、系统作用域、高 16 位 setup;
/// 5. 单次 release 存储发布头字,这是设备可见之前对槽的最后一次写;
/// 6. 以保留的索引值敲门铃。
pub fn submit(
    queue: &Queue,
    entry: &EntryPoint,
    args: &ArgBuffer,
    grid: [u32; 3],
    workgroup: [u16; 3],
    signal: &Signal,
) {
    let index = queue.add_write_index_relaxed(1);
    let slot = queue.ring_index().slot(index);
    let packet = &queue.packets()[slot];

    // 安全性:容量大于在途记录数,此槽头字为 Invalid 且本线程是唯一生产者。
    unsafe {
        let record = packet.record();
        write_bytes(
            record.cast::<u8>().add(PACKET_HEAD_BYTES),
            0,
            size_of::<PacketRecord>() - PACKET_HEAD_BYTES,
        );
        (*record).completion_signal = signal.handle();
        (*record).workgroup_size = workgroup;
        (*record).grid_size = grid;
        (*record).kernel_object = entry.kernel_object;
        (*record).kernarg_address = args.device_ptr();
        (*record).group_segment_size = entry.group_segment_size;
        (*record).private_segment_size = 0;
    }

    let header = (PacketType::KernelDispatch as u32) << HEADER_TYPE
        | 1 << HEADER_BARRIER
        | (FenceScope::System as u32) << HEADER_ACQUIRE_FENCE_SCOPE
        | (FenceScope::System as u32) << HEADER_RELEASE_FENCE_SCOPE;
    let setup = (header_dims(grid) as u32) << SETUP_DIMENSIONS;
    packet.publish(header | setup << 16);

    trace!("packet {index} published at slot {slot}");
    queue.doorbell().store(index as i64);
}
