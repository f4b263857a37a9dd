use super::WorkItem;
use bytemuck::{Pod, Zeroable};

/// 把隐式参数块中的几何信息写回输出缓冲,供宿主侧校验布局:
/// [block_count ×3, group_size ×3, grid_dims],共 7 个 u32。
pub(super) unsafe fn dispatch_probe(item: &WorkItem) {
    #[derive(Clone, Copy, Pod, Zeroable)]
    #[repr(C)]
    struct Args {
        output: u64,
    }

    if item.workgroup_id != [0, 0, 0] || item.workitem_id != [0, 0, 0] {
        return;
    }

    let Args { output } = item.args();
    let implicit = item.implicit_args();
    let out = output as usize as *mut u32;
    for (i, &count) in implicit.block_count.iter().enumerate() {
        out.add(i).write(count);
    }
    for (i, &size) in implicit.group_size.iter().enumerate() {
        out.add(3 + i).write(size as u32);
    }
    out.add(6).write(implicit.grid_dims as u32);
}
