use bytemuck::{Pod, Zeroable};
use std::{
    cell::UnsafeCell,
    sync::atomic::{
        AtomicU32,
        Ordering::{Acquire, Release},
    },
};

/// 指令包类型,编号与命令处理器的约定一致。
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum PacketType {
    VendorSpecific = 0,
    Invalid = 1,
    KernelDispatch = 2,
}

/// 内存栅栏作用域。
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum FenceScope {
    None = 0,
    Agent = 1,
    System = 2,
}

pub const HEADER_TYPE: u32 = 0;
pub const HEADER_BARRIER: u32 = 8;
pub const HEADER_ACQUIRE_FENCE_SCOPE: u32 = 9;
pub const HEADER_RELEASE_FENCE_SCOPE: u32 = 11;
pub const SETUP_DIMENSIONS: u32 = 0;

/// 头字节数,清零记录体时跳过。
pub const PACKET_HEAD_BYTES: usize = 4;

/// 头字为 Invalid 类型、其余位全零的初始状态。
pub const INVALID_HEAD: u32 = (PacketType::Invalid as u32) << HEADER_TYPE;

/// 头字低 16 位中的指令包类型字段。
#[inline]
pub const fn packet_type(head: u32) -> u32 {
    (head >> HEADER_TYPE) & 0xff
}

/// 头字高 16 位 setup 字段中的调度维数。
#[inline]
pub const fn setup_dims(head: u32) -> u16 {
    ((head >> 16) >> SETUP_DIMENSIONS) as u16 & 0b11
}

/// 环形队列槽中的一条调度记录,64 字节,布局与命令处理器约定一致。
/// 头字与 setup 字段合并在首个 32 位字中。
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub struct PacketRecord {
    pub head: u32,
    pub workgroup_size: [u16; 3],
    pub reserved0: u16,
    pub grid_size: [u32; 3],
    pub private_segment_size: u32,
    pub group_segment_size: u32,
    pub kernel_object: u64,
    pub kernarg_address: u64,
    pub reserved1: u64,
    pub completion_signal: u64,
}

/// 可被并发消费者观察的调度槽。
///
/// 发布协议:头字读作 Invalid 期间,生产者独占写入记录体;
/// 随后以单次 release 存储发布头字,这必须是发布前对槽的最后一次写入。
/// 消费者 acquire 读取头字,观察到非 Invalid 类型后方可读取记录体,
/// 消费完成后将头字恢复为 Invalid 以回收槽位。
#[repr(C, align(64))]
pub struct DispatchPacket(UnsafeCell<PacketRecord>);

// 安全性:并发访问由上述发布协议约束。
unsafe impl Send for DispatchPacket {}
unsafe impl Sync for DispatchPacket {}

impl Default for DispatchPacket {
    #[inline]
    fn default() -> Self {
        Self(UnsafeCell::new(PacketRecord {
            head: INVALID_HEAD,
            ..Zeroable::zeroed()
        }))
    }
}

impl DispatchPacket {
    /// 记录首字段即头字,布局与 `AtomicU32` 相同。
    #[inline]
    fn head_atomic(&self) -> &AtomicU32 {
        unsafe { &*self.0.get().cast::<AtomicU32>() }
    }

    #[inline]
    pub fn header_acquire(&self) -> u32 {
        self.head_atomic().load(Acquire)
    }

    /// 调度记录指针。
    ///
    /// 安全性:仅当头字为 Invalid 且调用者是该槽唯一生产者时,
    /// 方可经此指针写入除头字外的字段;消费者须在 acquire 读到
    /// 非 Invalid 头字后才读取。
    #[inline]
    pub const fn record(&self) -> *mut PacketRecord {
        self.0.get()
    }

    /// 发布头字。此后记录体对消费者可见。
    #[inline]
    pub fn publish(&self, head: u32) {
        self.head_atomic().store(head, Release)
    }

    /// 消费完成,槽位回收。
    #[inline]
    pub fn retire(&self) {
        self.head_atomic().store(INVALID_HEAD, Release)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::mem::{align_of, offset_of, size_of};

    #[test]
    fn test_layout() {
        assert_eq!(size_of::<PacketRecord>(), 64);
        assert_eq!(size_of::<DispatchPacket>(), 64);
        assert_eq!(align_of::<DispatchPacket>(), 64);

        assert_eq!(offset_of!(PacketRecord, head), 0);
        assert_eq!(offset_of!(PacketRecord, workgroup_size), 4);
        assert_eq!(offset_of!(PacketRecord, grid_size), 12);
        assert_eq!(offset_of!(PacketRecord, private_segment_size), 24);
        assert_eq!(offset_of!(PacketRecord, group_segment_size), 28);
        assert_eq!(offset_of!(PacketRecord, kernel_object), 32);
        assert_eq!(offset_of!(PacketRecord, kernarg_address), 40);
        assert_eq!(offset_of!(PacketRecord, completion_signal), 56);
    }

    #[test]
    fn test_head_word() {
        let header = (PacketType::KernelDispatch as u32) << HEADER_TYPE
            | 1 << HEADER_BARRIER
            | (FenceScope::System as u32) << HEADER_ACQUIRE_FENCE_SCOPE
            | (FenceScope::System as u32) << HEADER_RELEASE_FENCE_SCOPE;
        let head = header | (3 << SETUP_DIMENSIONS) << 16;
        assert_eq!(packet_type(head), PacketType::KernelDispatch as u32);
        assert_eq!(setup_dims(head), 3);
        assert_eq!(packet_type(INVALID_HEAD), PacketType::Invalid as u32);
        assert_eq!(setup_dims(INVALID_HEAD), 0);
    }

    /// 观察者在头字变为有效前不得看到不完整的记录体。
    #[test]
    fn test_publication_order() {
        use std::{sync::atomic::AtomicBool, thread, time::Duration};

        let packet = DispatchPacket::default();
        let done = AtomicBool::new(false);
        let head = (PacketType::KernelDispatch as u32) << HEADER_TYPE;

        thread::scope(|s| {
            s.spawn(|| {
                for round in 1..=8u64 {
                    // 逐字段慢写,再发布
                    unsafe {
                        let r = packet.record();
                        (*r).kernel_object = round;
                        thread::sleep(Duration::from_millis(1));
                        (*r).kernarg_address = round * 3;
                        thread::sleep(Duration::from_millis(1));
                        (*r).completion_signal = round * 7;
                    }
                    packet.publish(head);
                    while packet_type(packet.header_acquire()) != PacketType::Invalid as u32 {
                        std::hint::spin_loop();
                    }
                }
                done.store(true, std::sync::atomic::Ordering::Release);
            });
            s.spawn(|| {
                let mut seen = 0;
                while !done.load(std::sync::atomic::Ordering::Acquire) {
                    if packet_type(packet.header_acquire()) == PacketType::KernelDispatch as u32 {
                        let r = unsafe { packet.record().read() };
                        assert_eq!(r.kernarg_address, r.kernel_object * 3);
                        assert_eq!(r.completion_signal, r.kernel_object * 7);
                        seen += 1;
                        packet.retire();
                    }
                    std::hint::spin_loop();
                }
                assert!(seen > 0);
            });
        });
    }
}
