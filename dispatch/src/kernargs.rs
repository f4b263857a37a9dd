use crate::{
    device::Topology,
    error::{exhausted, inaccessible, kernarg_undersized, AllocError},
    symbol::EntryPoint,
};
use bytemuck::{bytes_of, Pod, Zeroable};
use common::{implicit_args_offset, ImplicitArgs};
use dev_virtual_gpu::RegionAlloc;
use std::mem::size_of;

/// 每次调度新分配的内核参数缓冲。
///
/// 显式参数结构在偏移 0,隐式几何块紧随其后(对齐到 8 字节)。
/// 缓冲持有参数内存区的分配,调用者须保持其存活直至等待返回,
/// 随析构归还。生存期是显式策略,不靠泄漏。
pub struct ArgBuffer {
    alloc: RegionAlloc,
    explicit_size: usize,
}

impl ArgBuffer {
    #[inline]
    pub fn device_ptr(&self) -> u64 {
        self.alloc.device_ptr()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.alloc.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.alloc.is_empty()
    }

    #[inline]
    pub fn explicit_size(&self) -> usize {
        self.explicit_size
    }

    /// 宿主侧字节视图。
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        self.alloc.host_view().unwrap_or(&[])
    }
}

/// 隐式块维数:某一维的网格尺寸×工作组尺寸之积不为 1 才计入。
/// 刻意区别于提交路径头字的维数规则(只看网格尺寸),
/// 两条规则可能对同一调度给出不同维数,保持原样不收敛。
pub(crate) fn implicit_dims(grid: [u32; 3], workgroup: [u16; 3]) -> u16 {
    1 + (grid[1] as u64 * workgroup[1] as u64 != 1) as u16
        + (grid[2] as u64 * workgroup[2] as u64 != 1) as u16
}

/// 把显式参数与隐式几何块编组进参数内存。
///
/// 按入口声明的参数段大小分配并清零;声明必须容得下
/// 显式结构加隐式块,否则拒绝。
pub fn marshal<A: Pod>(
    topology: &Topology,
    entry: &EntryPoint,
    args: &A,
    grid: [u32; 3],
    workgroup: [u16; 3],
) -> Result<ArgBuffer, AllocError> {
    let explicit = bytes_of(args);
    let offset = implicit_args_offset(explicit.len());
    let need = offset + size_of::<ImplicitArgs>();
    let declared = entry.kernarg_segment_size as usize;
    if declared < need {
        return Err(kernarg_undersized(format!(
            "kernarg segment {declared} bytes, {need} required",
        )));
    }

    let mut alloc = topology
        .regions
        .kernarg
        .alloc(declared)
        .map_err(|e| exhausted(format!("kernarg alloc {declared} bytes: {e:?}")))?;
    let buffer = alloc
        .host_view_mut()
        .ok_or_else(|| inaccessible("kernarg region not host accessible"))?;

    buffer[..explicit.len()].copy_from_slice(explicit);
    let implicit = ImplicitArgs {
        block_count: grid,
        group_size: workgroup,
        grid_dims: implicit_dims(grid, workgroup),
        ..Zeroable::zeroed()
    };
    buffer[offset..offset + size_of::<ImplicitArgs>()].copy_from_slice(bytes_of(&implicit));

    Ok(ArgBuffer {
        alloc,
        explicit_size: explicit.len(),
    })
}
