use crate::error::{no_gpu_agent, no_kernarg_region, InitError};
use dev_virtual_gpu::{Agent, DeviceKind, Region, Runtime, Segment};
use log::info;

/// 发现结果:选定的代理与按角色分类的内存区。
pub struct Topology {
    pub gpu: Agent,
    pub cpu: Option<Agent>,
    pub regions: RegionRoles,
}

/// GPU 代理全局段内存区的四种角色。
/// 参数内存缺失即初始化失败,其余角色按需取用。
pub struct RegionRoles {
    /// 细粒度,宿主发起缓冲(如程序二进制)的暂存。
    pub system: Option<Region>,
    /// 粗粒度且宿主可访问的设备内存。
    pub local: Option<Region>,
    /// 粗粒度且仅设备可见的内存。
    pub gpu_local: Option<Region>,
    /// 内核参数专用。
    pub kernarg: Region,
}

/// 枚举全部代理并分类选定 GPU 代理的内存区。
/// 代理先到先得;内存区同一角色后到覆盖先到。
pub fn discover(runtime: &Runtime) -> Result<Topology, InitError> {
    let mut gpu = None;
    let mut cpu = None;
    for agent in runtime.agents() {
        match agent.kind() {
            DeviceKind::Gpu if gpu.is_none() => gpu = Some(agent),
            DeviceKind::Cpu if cpu.is_none() => cpu = Some(agent),
            _ => {}
        }
    }
    let gpu = gpu.ok_or_else(|| no_gpu_agent("no gpu agent enumerated"))?;
    info!("using agent: {}", gpu.name());

    let (system, local, gpu_local, kernarg) = classify(&gpu.regions());
    let kernarg =
        kernarg.ok_or_else(|| no_kernarg_region("failed to find kernarg memory region"))?;
    Ok(Topology {
        gpu,
        cpu,
        regions: RegionRoles {
            system,
            local,
            gpu_local,
            kernarg,
        },
    })
}

type Classified = (
    Option<Region>,
    Option<Region>,
    Option<Region>,
    Option<Region>,
);

/// 非全局段跳过;粒度、宿主可访问性与 kernarg 标志正交,
/// 一个内存区可以同时落入多个角色。
fn classify(regions: &[Region]) -> Classified {
    let mut system = None;
    let mut local = None;
    let mut gpu_local = None;
    let mut kernarg = None;
    for region in regions {
        let info = region.info();
        if info.segment != Segment::Global {
            continue;
        }
        if info.fine_grained {
            system = Some(region.clone());
        }
        if info.coarse_grained {
            if info.host_accessible {
                local = Some(region.clone());
            } else {
                gpu_local = Some(region.clone());
            }
        }
        if info.kernarg {
            kernarg = Some(region.clone());
        }
    }
    (system, local, gpu_local, kernarg)
}
