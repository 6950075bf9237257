use std::net::SocketAddr;

use relay_proxy_lib::core::resolve::resolve;

#[tokio::test]
async fn resolves_literal_socket_addr_without_dns() {
    let addr = resolve("127.0.0.1:9000").await.unwrap();
    assert_eq!(addr, "127.0.0.1:9000".parse::<SocketAddr>().unwrap());
}

#[tokio::test]
async fn resolves_and_caches_localhost() {
    let addr = resolve("localhost:9001").await.unwrap();
    assert_eq!(addr.port(), 9001);
    assert!(addr.ip().is_loopback());

    let cached = resolve("localhost:9001").await.unwrap();
    assert_eq!(addr, cached);
}

#[tokio::test]
async fn rejects_host_with_no_dns_records() {
    let err = resolve("this.host.does.not.resolve.invalid:1234").await;
    assert!(err.is_err());
}
