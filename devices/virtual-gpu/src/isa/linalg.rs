use super::WorkItem;
use bytemuck::{Pod, Zeroable};

/// output[i] = input_a[i] + input_b[i]
///
/// 不检查边界,网格必须恰好覆盖元素数。
pub(super) unsafe fn add_arrays(item: &WorkItem) {
    #[derive(Clone, Copy, Pod, Zeroable)]
    #[repr(C)]
    struct Args {
        input_a: u64,
        input_b: u64,
        output: u64,
    }

    let Args {
        input_a,
        input_b,
        output,
    } = item.args();
    let index = item.global_id(0) as usize;
    let a = (input_a as usize as *const i32).add(index).read();
    let b = (input_b as usize as *const i32).add(index).read();
    (output as usize as *mut i32).add(index).write(a + b);
}

/// C (N×K) = A (N×M) · B (M×K),行 = y 维,列 = x 维。
pub(super) unsafe fn matrix_multiply(item: &WorkItem) {
    #[derive(Clone, Copy, Pod, Zeroable)]
    #[repr(C)]
    struct Args {
        c: u64,
        a: u64,
        b: u64,
        n: i32,
        m: i32,
        k: i32,
        reserved: i32,
    }

    let Args { c, a, b, n, m, k, .. } = item.args();
    let row = item.global_id(1) as i32;
    let col = item.global_id(0) as i32;
    if row >= n || col >= k {
        return;
    }

    let a = a as usize as *const f32;
    let b = b as usize as *const f32;
    let mut sum = 0.0f32;
    for i in 0..m {
        sum += a.add((row * m + i) as usize).read() * b.add((i * k + col) as usize).read();
    }
    (c as usize as *mut f32).add((row * k + col) as usize).write(sum);
}
