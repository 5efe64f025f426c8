//! Cross-invocation allocation behavior of the subnet allocator.
//!
//! Every test drives the allocator through its public API only, with the
//! allocation document rooted in a scratch directory.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::net::Ipv4Addr;

use coracle_net::{Cidr, IpAllocator};

fn scratch() -> (tempfile::TempDir, IpAllocator) {
    let dir = tempfile::tempdir().expect("tempdir");
    let ipam = IpAllocator::new(dir.path().join("ipam").join("subnet.json"));
    (dir, ipam)
}

#[test]
fn allocate_then_release_all_restores_the_free_pool() {
    let (_dir, ipam) = scratch();
    let subnet: Cidr = "10.9.0.0/28".parse().expect("cidr");
    let capacity = subnet.capacity();

    let mut held = Vec::new();
    for _ in 0..capacity {
        held.push(ipam.allocate(&subnet).expect("allocate"));
    }
    assert!(ipam.allocate(&subnet).is_err(), "pool must be exhausted");

    for ip in &held {
        ipam.release(&subnet, *ip).expect("release");
    }

    // After a full round-trip the whole sequence is allocatable again,
    // starting from the first host address.
    let ip = ipam.allocate(&subnet).expect("fresh allocate");
    assert_eq!(ip, Ipv4Addr::new(10, 9, 0, 1));
}

#[test]
fn no_address_is_handed_out_twice_while_held() {
    let (_dir, ipam) = scratch();
    let subnet: Cidr = "10.10.0.0/26".parse().expect("cidr");

    let mut seen = std::collections::HashSet::new();
    for _ in 0..subnet.capacity() {
        let ip = ipam.allocate(&subnet).expect("allocate");
        assert!(seen.insert(ip), "duplicate address {ip}");
    }
}

#[test]
fn subnets_are_tracked_independently() {
    let (_dir, ipam) = scratch();
    let a: Cidr = "10.11.0.0/24".parse().expect("cidr");
    let b: Cidr = "10.12.0.0/24".parse().expect("cidr");

    let ip_a = ipam.allocate(&a).expect("allocate a");
    let ip_b = ipam.allocate(&b).expect("allocate b");
    assert_eq!(ip_a, Ipv4Addr::new(10, 11, 0, 1));
    assert_eq!(ip_b, Ipv4Addr::new(10, 12, 0, 1));

    // Releasing in one subnet never frees slots in the other.
    ipam.release(&a, ip_a).expect("release a");
    let ip_b2 = ipam.allocate(&b).expect("allocate b again");
    assert_eq!(ip_b2, Ipv4Addr::new(10, 12, 0, 2));
}

#[test]
fn allocations_resume_across_handles() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("subnet.json");
    let subnet: Cidr = "10.13.0.0/29".parse().expect("cidr");

    for n in 1..=4u8 {
        // A new handle per iteration simulates separate CLI invocations.
        let ip = IpAllocator::new(&path).allocate(&subnet).expect("allocate");
        assert_eq!(ip, Ipv4Addr::new(10, 13, 0, n));
    }
}
