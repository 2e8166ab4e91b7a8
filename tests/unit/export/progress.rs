use super::*;

#[test]
fn percent_rounds_to_nearest() {
    let p = |completed, total| ExportProgress { completed, total }.percent();
    assert_eq!(p(1, 3), 33);
    assert_eq!(p(2, 3), 67);
    assert_eq!(p(3, 3), 100);
    assert_eq!(p(1, 8), 13);
    assert_eq!(p(0, 5), 0);
    assert_eq!(ExportProgress::idle().percent(), 0);
    assert!(ExportProgress::idle().is_idle());
    assert!(!ExportProgress::start(2).is_idle());
}

#[test]
fn tracker_resets_then_reports_each_commit() {
    let mut seen = Vec::new();
    {
        let mut obs = |p: u8| seen.push(p);
        let mut tracker = ProgressTracker::begin(&mut obs, 3);
        for i in 0..3 {
            tracker.committed(i);
        }
        assert_eq!(tracker.state(), ExportProgress { completed: 3, total: 3 });
    }
    assert_eq!(seen, vec![0, 33, 67, 100]);
}

#[test]
fn many_items_never_decrease() {
    let mut seen = Vec::new();
    {
        let mut obs = |p: u8| seen.push(p);
        let mut tracker = ProgressTracker::begin(&mut obs, 250);
        for i in 0..250 {
            tracker.committed(i);
        }
    }
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(seen.last(), Some(&100));
}
