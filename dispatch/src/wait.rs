use dev_virtual_gpu::{Signal, WaitState};

/// 阻塞直至完成信号值降到 1 以下,返回观察到的值。
/// 无超时、无取消:设备停摆则调用线程一直挂起。
#[inline]
pub fn wait(signal: &Signal, state: WaitState) -> i64 {
    signal.wait_lt(1, state)
}

#[cfg(test)]
mod test {
    use super::wait;
    use dev_virtual_gpu::{Runtime, WaitState};
    use std::{thread, time::Duration};

    #[test]
    fn test_wait() {
        let rt = Runtime::new();
        for state in [WaitState::Active, WaitState::Blocked] {
            let signal = rt.create_signal(1);
            thread::scope(|s| {
                s.spawn(|| {
                    thread::sleep(Duration::from_millis(5));
                    signal.subtract(1);
                });
                assert!(wait(&signal, state) < 1);
            });
        }
    }
}
