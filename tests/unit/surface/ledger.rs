//! Tests for surface memory accounting

#[cfg(test)]
mod tests {
    use seamtile::surface::ledger::SurfaceLedger;

    // Tests leases add to live bytes and return them on drop
    // Verified by skipping the subtraction in the lease destructor
    #[test]
    fn test_lease_returns_bytes_on_drop() {
        let ledger = SurfaceLedger::new();
        let first = ledger.acquire(100);
        let second = ledger.acquire(50);

        assert_eq!(ledger.live_bytes(), 150);
        assert_eq!(first.bytes(), 100);

        drop(first);
        assert_eq!(ledger.live_bytes(), 50);
        drop(second);
        assert_eq!(ledger.live_bytes(), 0);
    }

    // Tests peak tracks the highest simultaneous total
    // Verified by recording the latest total instead of the maximum
    #[test]
    fn test_peak_survives_release() {
        let ledger = SurfaceLedger::new();
        {
            let _a = ledger.acquire(64);
            let _b = ledger.acquire(64);
        }
        let _c = ledger.acquire(32);

        assert_eq!(ledger.peak_bytes(), 128);
        assert_eq!(ledger.live_bytes(), 32);
        assert_eq!(ledger.acquisitions(), 3);
    }

    #[test]
    fn test_concurrent_leases_balance() {
        let ledger = SurfaceLedger::new();

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let ledger = &ledger;
                scope.spawn(move || {
                    for _ in 0..100 {
                        let lease = ledger.acquire(16);
                        drop(lease);
                    }
                });
            }
        });

        assert_eq!(ledger.live_bytes(), 0);
        assert_eq!(ledger.acquisitions(), 800);
        assert!(ledger.peak_bytes() >= 16);
    }
}
