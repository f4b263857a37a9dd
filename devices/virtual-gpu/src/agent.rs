use crate::{
    memory::{Region, RegionDesc, RegionState},
    RuntimeCore,
};
use std::sync::Arc;

/// 代理的设备类别。
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DeviceKind {
    Cpu,
    Gpu,
}

/// 拓扑声明中的一个代理。
#[derive(Clone, Debug)]
pub struct AgentDesc {
    pub kind: DeviceKind,
    pub name: String,
    pub queue_max_size: u32,
    pub regions: Vec<RegionDesc>,
}

pub(crate) struct AgentState {
    pub desc: AgentDesc,
    pub regions: Vec<RegionState>,
}

impl AgentState {
    pub fn new(desc: AgentDesc) -> Self {
        let regions = desc.regions.iter().map(RegionState::new).collect();
        Self { desc, regions }
    }
}

/// 计算或宿主处理器的不透明句柄。
#[derive(Clone)]
pub struct Agent {
    core: Arc<RuntimeCore>,
    index: usize,
}

impl PartialEq for Agent {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.core, &other.core) && self.index == other.index
    }
}
impl Eq for Agent {}

impl Agent {
    pub(crate) fn new(core: Arc<RuntimeCore>, index: usize) -> Self {
        Self { core, index }
    }

    #[inline]
    pub fn kind(&self) -> DeviceKind {
        self.core.agent_state(self.index).desc.kind
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.core.agent_state(self.index).desc.name
    }

    #[inline]
    pub fn queue_max_size(&self) -> u32 {
        self.core.agent_state(self.index).desc.queue_max_size
    }

    /// 枚举该代理的内存区,顺序即拓扑声明顺序。
    pub fn regions(&self) -> Vec<Region> {
        (0..self.core.agent_state(self.index).regions.len())
            .map(|region| Region::new(self.core.clone(), self.index, region))
            .collect()
    }
}
