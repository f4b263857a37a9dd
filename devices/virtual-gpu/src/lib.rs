#![deny(warnings)]

//! 进程内的虚拟加速器运行时。
//!
//! 对外提供与真实驱动一致的表面:代理与内存区枚举、信号、
//! 带门铃的环形命令队列、代码对象的装载与冻结。
//! 命令处理器运行在宿主线程上,地址空间统一,设备指针即宿主地址。

mod agent;
mod code_object;
mod executable;
pub mod isa;
mod memory;
mod processor;
mod queue;
mod signal;

pub use agent::{Agent, AgentDesc, DeviceKind};
pub use code_object::{CodeObject, CodeObjectBuilder, CodeObjectError};
pub use executable::{Executable, ExecutableError, SymbolInfo};
pub use memory::{Region, RegionAlloc, RegionAllocError, RegionDesc, RegionInfo, Segment};
pub use queue::{Queue, QueueError};
pub use signal::{Signal, WaitState};

use agent::AgentState;
use isa::KernelFn;
use memory::RegionState;
use signal::SignalCore;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering::Relaxed},
        Arc, RwLock,
    },
};

/// 虚拟运行时句柄。同一进程可以有多个互不相关的实例。
#[derive(Clone)]
pub struct Runtime(Arc<RuntimeCore>);

impl Default for Runtime {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    /// 以默认拓扑构造:一个 GPU 代理、一个 CPU 代理。
    pub fn new() -> Self {
        Self::with_agents(default_topology())
    }

    /// 以自定义拓扑构造。
    pub fn with_agents(agents: Vec<AgentDesc>) -> Self {
        Self(Arc::new(RuntimeCore {
            agents: agents.into_iter().map(AgentState::new).collect(),
            signals: Default::default(),
            kernels: Default::default(),
            next_handle: AtomicU64::new(1),
        }))
    }

    /// 枚举全部代理,顺序即拓扑声明顺序。
    pub fn agents(&self) -> Vec<Agent> {
        (0..self.0.agents.len())
            .map(|index| Agent::new(self.0.clone(), index))
            .collect()
    }

    /// 创建设备可观察的计数信号。
    pub fn create_signal(&self, initial: i64) -> Signal {
        Signal::new(self.0.clone(), initial)
    }

    /// 在 GPU 代理上创建命令队列并启动其命令处理器。
    pub fn create_queue(&self, agent: &Agent, capacity: u32) -> Result<Queue, QueueError> {
        Queue::create(self.0.clone(), agent, capacity)
    }

    pub(crate) fn core(&self) -> Arc<RuntimeCore> {
        self.0.clone()
    }
}

pub(crate) struct RuntimeCore {
    agents: Vec<AgentState>,
    signals: RwLock<HashMap<u64, Arc<SignalCore>>>,
    kernels: RwLock<HashMap<u64, KernelRecord>>,
    next_handle: AtomicU64,
}

/// 冻结可执行程序时注册的内核对象。
#[derive(Clone, Copy)]
pub(crate) struct KernelRecord {
    pub func: KernelFn,
    pub explicit_args_size: u32,
}

impl RuntimeCore {
    #[inline]
    pub(crate) fn agent_state(&self, index: usize) -> &AgentState {
        &self.agents[index]
    }

    #[inline]
    pub(crate) fn region_state(&self, agent: usize, index: usize) -> &RegionState {
        &self.agents[agent].regions[index]
    }

    #[inline]
    pub(crate) fn next_handle(&self) -> u64 {
        self.next_handle.fetch_add(1, Relaxed)
    }

    pub(crate) fn register_signal(&self, core: Arc<SignalCore>) -> u64 {
        let handle = self.next_handle();
        let _ = self.signals.write().unwrap().insert(handle, core);
        handle
    }

    pub(crate) fn unregister_signal(&self, handle: u64) {
        let _ = self.signals.write().unwrap().remove(&handle);
    }

    pub(crate) fn signal(&self, handle: u64) -> Option<Arc<SignalCore>> {
        self.signals.read().unwrap().get(&handle).cloned()
    }

    pub(crate) fn register_kernel(&self, record: KernelRecord) -> u64 {
        let handle = self.next_handle();
        let _ = self.kernels.write().unwrap().insert(handle, record);
        handle
    }

    pub(crate) fn unregister_kernel(&self, handle: u64) {
        let _ = self.kernels.write().unwrap().remove(&handle);
    }

    pub(crate) fn kernel(&self, handle: u64) -> Option<KernelRecord> {
        self.kernels.read().unwrap().get(&handle).copied()
    }
}

fn default_topology() -> Vec<AgentDesc> {
    const MIB: usize = 1 << 20;
    vec![
        AgentDesc {
            kind: DeviceKind::Gpu,
            name: "vgpu".into(),
            queue_max_size: 256,
            regions: vec![
                // 细粒度,宿主可访问:暂存区
                RegionDesc {
                    segment: Segment::Global,
                    fine_grained: true,
                    coarse_grained: false,
                    host_accessible: true,
                    kernarg: false,
                    size: 16 * MIB,
                },
                // 粗粒度,宿主可访问
                RegionDesc {
                    segment: Segment::Global,
                    fine_grained: false,
                    coarse_grained: true,
                    host_accessible: true,
                    kernarg: false,
                    size: 64 * MIB,
                },
                // 粗粒度,仅设备可见
                RegionDesc {
                    segment: Segment::Global,
                    fine_grained: false,
                    coarse_grained: true,
                    host_accessible: false,
                    kernarg: false,
                    size: 64 * MIB,
                },
                // 内核参数专用
                RegionDesc {
                    segment: Segment::Global,
                    fine_grained: false,
                    coarse_grained: false,
                    host_accessible: true,
                    kernarg: true,
                    size: MIB,
                },
                // 非全局段,枚举时应被跳过
                RegionDesc {
                    segment: Segment::Group,
                    fine_grained: false,
                    coarse_grained: false,
                    host_accessible: false,
                    kernarg: false,
                    size: 64 << 10,
                },
            ],
        },
        AgentDesc {
            kind: DeviceKind::Cpu,
            name: "host".into(),
            queue_max_size: 0,
            regions: vec![RegionDesc {
                segment: Segment::Global,
                fine_grained: true,
                coarse_grained: false,
                host_accessible: true,
                kernarg: false,
                size: 256 * MIB,
            }],
        },
    ]
}
