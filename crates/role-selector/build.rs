fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var_os("PROTOC").is_none() {
        std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);
    }

    // Compile the consensus-policy protobuf into Rust code. The selector is
    // both a client (SelectionService.RequestRoles) and a server
    // (SchedulingService.TriggerRole) for this side channel.
    tonic_prost_build::configure()
        .build_client(true)
        .build_server(true)
        .compile_protos(&["proto/colmena.proto"], &["proto"])?;

    Ok(())
}
