#[cfg(all(feature = "tls-native-tls", feature = "tls-rustls"))]
compile_error!("features tls-native-tls and tls-rustls are mutually exclusive");

fn main() {
    println!("cargo:rustc-check-cfg=cfg(tls)");
    #[cfg(any(feature = "tls-native-tls", feature = "tls-rustls"))]
    println!("cargo:rustc-cfg=tls");
}
