// Build script for keeper-service
// Compiles keeper_service.proto for gRPC server and client code generation
fn main() {
    println!("cargo:rerun-if-changed=../proto/services/keeper_service.proto");

    // Use the vendored protoc so the build does not depend on a system install
    if std::env::var_os("PROTOC").is_none() {
        let protoc = protoc_bin_vendored::protoc_bin_path()
            .expect("Failed to locate vendored protoc binary");
        std::env::set_var("PROTOC", protoc);
    }

    // Server side for the service binary, client side for keeper-cli
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(
            &["../proto/services/keeper_service.proto"],
            &["../proto/services"],
        )
        .expect("Failed to compile keeper_service.proto for keeper-service");
}
