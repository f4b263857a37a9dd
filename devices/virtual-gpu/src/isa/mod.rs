//! 内建设备程序,即虚拟设备的"指令集":代码对象以编号引用这里的入口。

mod image;
mod linalg;
mod probe;

use bytemuck::Pod;
use common::ImplicitArgs;

pub const ADD_ARRAYS: u32 = 1;
pub const COLOR_TO_GRAYSCALE: u32 = 2;
pub const IMAGE_BLUR_MONOCHROME: u32 = 3;
pub const IMAGE_BLUR_RGB: u32 = 4;
pub const MATRIX_MULTIPLY: u32 = 5;
pub const DISPATCH_PROBE: u32 = 6;

pub(crate) type KernelFn = unsafe fn(&WorkItem);

pub(crate) fn builtin(id: u32) -> Option<KernelFn> {
    Some(match id {
        ADD_ARRAYS => linalg::add_arrays,
        COLOR_TO_GRAYSCALE => image::color_to_grayscale,
        IMAGE_BLUR_MONOCHROME => image::blur_monochrome,
        IMAGE_BLUR_RGB => image::blur_rgb,
        MATRIX_MULTIPLY => linalg::matrix_multiply,
        DISPATCH_PROBE => probe::dispatch_probe,
        _ => return None,
    })
}

/// 单个工作项可见的执行环境。
pub struct WorkItem {
    pub workgroup_id: [u32; 3],
    pub workitem_id: [u16; 3],
    pub workgroup_size: [u16; 3],
    pub grid_size: [u32; 3],
    pub(crate) kernarg: *const u8,
    pub(crate) implicit: *const u8,
}

impl WorkItem {
    /// 扁平全局编号:工作组编号 × 工作组尺寸 + 组内编号。
    #[inline]
    pub fn global_id(&self, dim: usize) -> u32 {
        self.workgroup_id[dim] * self.workgroup_size[dim] as u32 + self.workitem_id[dim] as u32
    }

    /// 读取显式参数结构。
    ///
    /// 安全性:参数缓冲必须按该类型的布局填充。
    #[inline]
    pub unsafe fn args<A: Pod>(&self) -> A {
        self.kernarg.cast::<A>().read_unaligned()
    }

    /// 经隐式参数指针读取隐式块。
    ///
    /// 安全性:参数缓冲必须在显式参数之后携带隐式块。
    #[inline]
    pub unsafe fn implicit_args(&self) -> ImplicitArgs {
        self.implicit.cast::<ImplicitArgs>().read_unaligned()
    }
}
