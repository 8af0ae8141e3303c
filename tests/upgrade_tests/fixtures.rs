//! Cluster configurations used by the scenarios

use std::io::Write;

use strata_common::ClusterConfig;
use tempfile::NamedTempFile;

/// Knobs of a bare-metal cluster configuration
#[derive(Clone, Debug)]
pub struct BareMetal {
    pub kubernetes_version: &'static str,
    pub endpoint: &'static str,
    pub tinkerbell_ip: &'static str,
    pub control_plane_selector: &'static str,
    pub worker_selector: &'static str,
}

impl Default for BareMetal {
    fn default() -> Self {
        Self {
            kubernetes_version: "1.30",
            endpoint: "10.80.0.10",
            tinkerbell_ip: "10.80.0.20",
            control_plane_selector: "cp",
            worker_selector: "worker",
        }
    }
}

impl BareMetal {
    /// Multi-document YAML for this configuration
    pub fn yaml(&self) -> String {
        format!(
            r#"apiVersion: anywhere.strata.dev/v1alpha1
kind: Cluster
metadata:
  name: prod
  namespace: default
spec:
  kubernetesVersion: "{version}"
  controlPlaneConfiguration:
    count: 3
    endpoint:
      host: {endpoint}
    machineGroupRef:
      kind: TinkerbellMachineConfig
      name: prod-cp
  workerNodeGroupConfigurations:
    - name: md-0
      count: 2
      machineGroupRef:
        kind: TinkerbellMachineConfig
        name: prod-worker
  datacenterRef:
    kind: TinkerbellDatacenterConfig
    name: prod
  clusterNetwork:
    pods:
      cidrBlocks: [192.168.0.0/16]
    services:
      cidrBlocks: [10.96.0.0/12]
---
apiVersion: anywhere.strata.dev/v1alpha1
kind: TinkerbellDatacenterConfig
metadata:
  name: prod
  namespace: default
spec:
  tinkerbellIP: {tinkerbell_ip}
  osImageURL: http://images.local/ubuntu-{version}.gz
---
apiVersion: anywhere.strata.dev/v1alpha1
kind: TinkerbellMachineConfig
metadata:
  name: prod-cp
  namespace: default
spec:
  hardwareSelector:
    type: {cp}
  osFamily: ubuntu
  users:
    - name: tink
      sshAuthorizedKeys: ["ssh-ed25519 AAAAC3Nz ops"]
---
apiVersion: anywhere.strata.dev/v1alpha1
kind: TinkerbellMachineConfig
metadata:
  name: prod-worker
  namespace: default
spec:
  hardwareSelector:
    type: {worker}
  osFamily: ubuntu
  users:
    - name: tink
      sshAuthorizedKeys: ["ssh-ed25519 AAAAC3Nz ops"]
"#,
            version = self.kubernetes_version,
            endpoint = self.endpoint,
            tinkerbell_ip = self.tinkerbell_ip,
            cp = self.control_plane_selector,
            worker = self.worker_selector,
        )
    }

    /// Parsed configuration
    pub fn config(&self) -> ClusterConfig {
        ClusterConfig::from_yaml(&self.yaml()).unwrap()
    }
}

/// A virtualized cluster with two OIDC providers, listed in the given order
pub fn vsphere_with_oidc(providers: [&str; 2]) -> String {
    let mut yaml = format!(
        r#"apiVersion: anywhere.strata.dev/v1alpha1
kind: Cluster
metadata:
  name: edge
  namespace: default
spec:
  kubernetesVersion: "1.29"
  controlPlaneConfiguration:
    count: 1
    endpoint:
      host: 10.90.0.10
    machineGroupRef:
      kind: VSphereMachineConfig
      name: edge-cp
  datacenterRef:
    kind: VSphereDatacenterConfig
    name: edge
  identityProviderRefs:
    - kind: OIDCConfig
      name: {first}
    - kind: OIDCConfig
      name: {second}
---
apiVersion: anywhere.strata.dev/v1alpha1
kind: VSphereDatacenterConfig
metadata:
  name: edge
  namespace: default
spec:
  datacenter: SDDC-Datacenter
  network: /SDDC-Datacenter/network/sddc-cgw-network-1
  server: vcenter.edge.local
---
apiVersion: anywhere.strata.dev/v1alpha1
kind: VSphereMachineConfig
metadata:
  name: edge-cp
  namespace: default
spec:
  template: /SDDC-Datacenter/vm/Templates/ubuntu-1-29
  users:
    - name: capv
      sshAuthorizedKeys: ["ssh-rsa AAAAB3Nz ops"]
"#,
        first = providers[0],
        second = providers[1],
    );
    for name in ["oidc-corp", "oidc-partner"] {
        yaml.push_str(&format!(
            r#"---
apiVersion: anywhere.strata.dev/v1alpha1
kind: OIDCConfig
metadata:
  name: {name}
  namespace: default
spec:
  clientId: {name}-client
  issuerUrl: https://{name}.example.com
"#
        ));
    }
    yaml
}

/// Write a configuration where the CLI can read it
pub fn write_config(yaml: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    file
}
