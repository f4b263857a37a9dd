use crate::{processor, Agent, DeviceKind, RuntimeCore, Signal};
use common::{DispatchPacket, RingIndex};
use std::{
    sync::{
        atomic::{AtomicU64, Ordering::Relaxed},
        Arc,
    },
    thread::JoinHandle,
};

/// 命令处理器的退场哨兵,经门铃传递。
pub(crate) const SHUTDOWN: i64 = i64::MIN;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum QueueError {
    /// 只有 GPU 代理支持命令队列。
    InvalidAgent,
    /// 容量必须是 2 的幂且不超过代理声明的上限。
    InvalidCapacity,
}

pub(crate) struct Ring {
    pub slots: Box<[DispatchPacket]>,
    pub index: RingIndex,
    write_index: AtomicU64,
}

/// 定容环形命令队列。
///
/// 创建即定容并启动命令处理器线程,析构时以哨兵门铃将其回收。
/// 写索引的保留是无锁的单次增量,对多个生产者安全;
/// 槽位在先前调度完成前不得复用,由容量大于在途记录数保证。
pub struct Queue {
    ring: Arc<Ring>,
    doorbell: Signal,
    worker: Option<JoinHandle<()>>,
}

impl Queue {
    pub(crate) fn create(
        runtime: Arc<RuntimeCore>,
        agent: &Agent,
        capacity: u32,
    ) -> Result<Self, QueueError> {
        if agent.kind() != DeviceKind::Gpu {
            return Err(QueueError::InvalidAgent);
        }
        let index = RingIndex::new(capacity).ok_or(QueueError::InvalidCapacity)?;
        if capacity > agent.queue_max_size() {
            return Err(QueueError::InvalidCapacity);
        }
        let ring = Arc::new(Ring {
            slots: (0..capacity).map(|_| DispatchPacket::default()).collect(),
            index,
            write_index: AtomicU64::new(0),
        });
        let doorbell = Signal::new(runtime.clone(), -1);
        let worker = {
            let ring = ring.clone();
            let doorbell = doorbell.core().clone();
            std::thread::spawn(move || processor::run(runtime, ring, doorbell))
        };
        Ok(Self {
            ring,
            doorbell,
            worker: Some(worker),
        })
    }

    #[inline]
    pub fn capacity(&self) -> u32 {
        self.ring.index.capacity()
    }

    #[inline]
    pub fn ring_index(&self) -> RingIndex {
        self.ring.index
    }

    /// 保留 `n` 个写索引,返回保留前的值。对所有生产者是同一原子增量。
    #[inline]
    pub fn add_write_index_relaxed(&self, n: u64) -> u64 {
        self.ring.write_index.fetch_add(n, Relaxed)
    }

    #[inline]
    pub fn packets(&self) -> &[DispatchPacket] {
        &self.ring.slots
    }

    #[inline]
    pub fn doorbell(&self) -> &Signal {
        &self.doorbell
    }
}

impl Drop for Queue {
    fn drop(&mut self) {
        self.doorbell.store(SHUTDOWN);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
