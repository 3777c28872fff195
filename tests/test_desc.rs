//! # hd-descriptors integration test
//!
//! Parse descriptors, evaluate them along external paths and check the
//! resulting scripts and addresses.
//!

use std::str::FromStr;

use actual_rand::seq::SliceRandom;
use actual_rand::Rng;
use bitcoin::secp256k1::Secp256k1;
use hd_descriptors::descriptor::DerivationPath;
use hd_descriptors::{parse, parse_with_path, Error, ExtendedKey, Network, ScriptKind};

const XPUB: &str = "xpub6ELHKXNimKbxMCytPh7EdC2QXx46T9qLDJWGnTraz1H9kMMFdcduoU69wh9cxP12wDxqAAfbaESWGYt5rREsX1J8iR2TEunvzvddduAPYcY";
const ZPUB: &str = "zpub6u4KbU8TSgNuZSxzv7HaGq5Tk361gMHdZxnM4UYuwzg5CMLcNytzhobitV4Zq6vWtWHpG9QijsigkxAzXvQWyLRfLq1L7VxPP1tky1hPfD4";
const ZPRV: &str = "zprvAWgYBBk7JR8Gjrh4UJQ2uJdG1r3WNRRfURiABBE3RvMXYSrRJL62XuezvGdPvG6GFBZduosCc1YP5wixPox7zhZLfiUm8aunE96BBa4Kei5";

const K1: &str = "03a1b26313f430c4b15bb1fdce663207659d8cac749a0e53d70eff01874496feff";
const K2: &str = "0375e00eb72e29da82b89367947f29ef34afb75e8654f6ea368e0acdfd92976b7c";
const K3: &str = "03c96d495bfdd5ba4145e3e046fee45e84a8a48ad05bd8dbb395c011a32cf9f880";

fn mainnet(desc: &str) -> String {
    parse(desc).unwrap().address(Network::Mainnet).unwrap()
}

fn mainnet_at(desc: &str, path: &str) -> String {
    parse_with_path(desc, path)
        .unwrap()
        .address(Network::Mainnet)
        .unwrap()
}

// rust-bitcoin renders the same address from the script bytes
fn check_with_rust_bitcoin(desc: &str) {
    let script = parse(desc).unwrap();
    let address =
        bitcoin::Address::from_script(&script.script_pubkey(), bitcoin::Network::Bitcoin).unwrap();
    assert_eq!(address.to_string(), script.address(Network::Mainnet).unwrap());
}

#[test]
fn literal_vectors() {
    assert_eq!(
        mainnet("pkh(03aaeb52dd7494c361049de67cc680e83ebcbbbdbeb13637d92cd845f70308af5e)"),
        "1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA"
    );
    assert_eq!(
        mainnet("wpkh(0330d54fd0dd420a6e5f8d3624f5f3482cae350f79d5f0753bf5beef9c2d91af3c)"),
        "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu"
    );
    assert_eq!(
        mainnet("sh(wpkh(039b3b694b8fc5b5e07fb069c783cac754f5d38c3e08bed1960e31fdb1dda35c24))"),
        "37VucYSaXLCAsxYyAPfbSi9eh4iEcbShgf"
    );
    assert_eq!(
        mainnet(&format!("wsh(multi(2,{},{},{}))", K1, K2, K3)),
        "bc1qwhahvweerhg22ghn8ssqjl5e6r6rjj92jhca266ccmxts65840ks3pu0dp"
    );
    assert_eq!(
        mainnet(&format!("wsh(sortedmulti(2,{},{},{}))", K1, K2, K3)),
        "bc1qwqdg6squsna38e46795at95yu9atm8azzmyvckulcc7kytlcckxswvvzej"
    );
    assert_eq!(
        mainnet(&format!("sh(wsh(multi(2,{},{},{})))", K1, K2, K3)),
        "3DfdkSJkHkc2WcCf97LpG2itrEYdS6nNLq"
    );
}

#[test]
fn other_networks() {
    let script =
        parse("pkh(03aaeb52dd7494c361049de67cc680e83ebcbbbdbeb13637d92cd845f70308af5e)").unwrap();
    assert_eq!(
        script.address(Network::Testnet).unwrap(),
        "n1M8ZVQtL7QoFvGMg24D6b2ojWvFXCGpoS"
    );

    let script = parse(&format!("wsh(multi(2,{},{},{}))", K1, K2, K3)).unwrap();
    assert_eq!(
        script.address(Network::Testnet).unwrap(),
        "tb1qwhahvweerhg22ghn8ssqjl5e6r6rjj92jhca266ccmxts65840ksxf2qhw"
    );

    let script =
        parse("sh(wpkh(039b3b694b8fc5b5e07fb069c783cac754f5d38c3e08bed1960e31fdb1dda35c24))")
            .unwrap();
    assert_eq!(
        script.address(Network::Regtest).unwrap(),
        "2My47gHNc8nhX5kBWqXHU4f8uuQvQKEgwMd"
    );
}

#[test]
fn agrees_with_rust_bitcoin() {
    check_with_rust_bitcoin(
        "pkh(03aaeb52dd7494c361049de67cc680e83ebcbbbdbeb13637d92cd845f70308af5e)",
    );
    check_with_rust_bitcoin(&format!("wpkh({}/7)", ZPUB));
    check_with_rust_bitcoin(&format!("sh(wpkh({}))", K1));
    check_with_rust_bitcoin(&format!("wsh(sortedmulti(2,{},{}/*,{}))", K3, XPUB, K1));
}

#[test]
fn zpub_receive_chain() {
    let desc = format!("wpkh({}/*)", ZPUB);
    let addresses: Vec<String> = (0..3)
        .map(|i| mainnet_at(&desc, &format!("m/{}", i)))
        .collect();
    assert_eq!(
        addresses,
        vec![
            "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu",
            "bc1qnjg0jd8228aq7egyzacy8cys3knf9xvrerkf9g",
            "bc1qp59yckz4ae5c4efgw2s5wfyvrz0ala7rgvuz8z",
        ]
    );
}

#[test]
fn private_key_with_origin() {
    // The origin of a private key is derived, hardened steps included
    let desc = format!("wpkh([00000000/84'/0'/0'/0]{}/*)", ZPRV);
    assert_eq!(
        mainnet_at(&desc, "m/0"),
        "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu"
    );
    assert_eq!(
        mainnet_at(&desc, "m/1"),
        "bc1qnjg0jd8228aq7egyzacy8cys3knf9xvrerkf9g"
    );
}

#[test]
fn sortedmulti_sorts_after_derivation() {
    let sorted = parse_with_path(&format!("wsh(sortedmulti(2,{}/*,{}/*))", XPUB, ZPUB), "m/0")
        .unwrap();
    assert_eq!(
        sorted.address(Network::Mainnet).unwrap(),
        "bc1qc0h2knqvncc9hwa7w0aaajgmkr3z42umr8n77rwxcwv4euykswlqr04amx"
    );
    // 0330d5.. (ZPUB/0) sorts before 03aaeb.. (XPUB/0)
    let explicit = parse(
        "wsh(multi(2,0330d54fd0dd420a6e5f8d3624f5f3482cae350f79d5f0753bf5beef9c2d91af3c,03aaeb52dd7494c361049de67cc680e83ebcbbbdbeb13637d92cd845f70308af5e))",
    )
    .unwrap();
    assert_eq!(sorted, explicit);

    let unsorted = parse_with_path(&format!("wsh(multi(2,{}/*,{}/*))", XPUB, ZPUB), "m/0").unwrap();
    assert_eq!(
        unsorted.address(Network::Mainnet).unwrap(),
        "bc1qrtsgkavk075pfzmxj6s6dpkkf0cshpu3q9xfh7m7d25nh8rkgulsvdcae6"
    );
}

#[test]
fn non_addressable_scripts() {
    let bare = parse(&format!("multi(2,{},{})", K1, K2)).unwrap();
    assert_eq!(bare.kind(), ScriptKind::BareMulti);
    assert!(!bare.as_bytes().is_empty());
    assert_eq!(bare.address(Network::Mainnet).unwrap(), "");

    let tr = parse(&format!("tr({},{{pk({}),pk({})}})", K1, K2, K3)).unwrap();
    assert_eq!(tr.kind(), ScriptKind::Tr);
    assert!(tr.as_bytes().is_empty());
    assert!(matches!(
        tr.address(Network::Mainnet),
        Err(Error::Unimplemented(_))
    ));
}

#[test]
fn error_cases() {
    assert!(matches!(parse("sh(pkh(the_key))"), Err(Error::KeyFormat(_))));
    assert!(matches!(parse("multi(2,onlyonekey)"), Err(Error::Grammar(_))));
    // OP_1 is never emitted as a threshold or key count
    assert!(matches!(
        parse(&format!("wsh(multi(1,{},{}))", K1, K2)),
        Err(Error::Grammar(_))
    ));
    assert!(matches!(
        parse(&format!("wsh(sh(pkh({})))", K1)),
        Err(Error::Grammar(_))
    ));
    assert!(matches!(
        parse(&format!("foo({})", K1)),
        Err(Error::Grammar(_))
    ));
    assert!(matches!(
        parse(&format!("wpkh({}", K1)),
        Err(Error::Grammar(_))
    ));
}

#[test]
fn boundaries() {
    // empty key
    assert!(matches!(parse("pkh()"), Err(Error::KeyFormat(_))));
    // path without m/
    assert!(matches!(
        parse_with_path(&format!("wpkh({}/*)", ZPUB), "0/1"),
        Err(Error::PathFormat(_))
    ));
    // hardened step on a public key, external or embedded
    assert_eq!(
        parse_with_path(&format!("wpkh({}/*)", ZPUB), "m/0'"),
        Err(Error::UnsupportedDerivation(0x8000_0000))
    );
    assert_eq!(
        parse(&format!("pkh({}/1h/2)", XPUB)),
        Err(Error::UnsupportedDerivation(0x8000_0001))
    );
    assert_eq!(
        parse(&format!("pkh([d34db33f/44'/0'/0']{})", XPUB)),
        Err(Error::UnsupportedDerivation(0x8000_002c))
    );
    // raw keys ignore the external path, hardened or not
    assert_eq!(
        parse_with_path(&format!("pkh({})", K1), "m/0'/1").unwrap(),
        parse(&format!("pkh({})", K1)).unwrap()
    );
}

#[test]
fn determinism() {
    let descs = [
        format!("wpkh({}/*)", ZPUB),
        format!("sh(wsh(sortedmulti(2,{}/0/*,{}/*,{})))", XPUB, ZPUB, K1),
        format!("pkh([d34db33f/0/1]{}/*)", XPUB),
    ];
    for desc in &descs {
        let first = parse_with_path(desc, "m/5").unwrap();
        for _ in 0..3 {
            let again = parse_with_path(desc, "m/5").unwrap();
            assert_eq!(again.as_bytes(), first.as_bytes());
            assert_eq!(again.to_hex(), first.to_hex());
        }
    }
}

#[test]
fn derivation_roundtrip() {
    let secp = Secp256k1::new();
    let xpub = ExtendedKey::from_str(XPUB).unwrap();
    let mut rng = actual_rand::thread_rng();

    for _ in 0..8 {
        let a: u32 = rng.gen_range(0..1 << 31);
        let b: u32 = rng.gen_range(0..1 << 31);
        let c: u32 = rng.gen_range(0..1 << 31);

        let parent = DerivationPath::from_str(&format!("m/{}/{}", a, b)).unwrap();
        let full = DerivationPath::from_str(&format!("m/{}/{}/{}", a, b, c)).unwrap();
        let stepwise = xpub
            .derive(&secp, &parent)
            .unwrap()
            .child_pub_key(&secp, c)
            .unwrap();
        let direct = xpub.derive(&secp, &full).unwrap().public_key(&secp);
        assert_eq!(stepwise, direct);

        // same thing through descriptor text and the external path
        let embedded = parse_with_path(
            &format!("pkh({}/{}/{}/*)", XPUB, a, b),
            &format!("m/{}", c),
        )
        .unwrap();
        let external =
            parse_with_path(&format!("pkh({})", XPUB), &format!("m/{}/{}/{}", a, b, c)).unwrap();
        assert_eq!(embedded, external);
    }
}

#[test]
fn sortedmulti_order_independence() {
    let secp = secp256k1::Secp256k1::new();
    let mut rng = secp256k1::rand::thread_rng();

    for _ in 0..4 {
        let mut keys: Vec<String> = (0..5)
            .map(|_| secp.generate_keypair(&mut rng).1.to_string())
            .collect();
        let reference = mainnet(&format!("wsh(sortedmulti(3,{}))", keys.join(",")));

        for _ in 0..6 {
            keys.shuffle(&mut rng);
            assert_eq!(
                mainnet(&format!("wsh(sortedmulti(3,{}))", keys.join(","))),
                reference
            );
        }

        keys.sort();
        assert_eq!(
            mainnet(&format!("wsh(multi(3,{}))", keys.join(","))),
            reference
        );
    }
}

#[cfg(feature = "serde")]
#[test]
fn serde_descriptor_roundtrip() {
    use hd_descriptors::Descriptor;

    let desc = Descriptor::from_str(&format!("wsh(sortedmulti(2,{}/*,{}))", XPUB, K1)).unwrap();
    let json = serde_json::to_string(&desc).unwrap();
    let back: Descriptor = serde_json::from_str(&json).unwrap();
    assert_eq!(back, desc);
    let net: Network = serde_json::from_str("\"mainnet\"").unwrap();
    assert_eq!(net, Network::Mainnet);
}
