//! Versioned, chunked binary "network image" persistence.
//!
//! Layout: 8-byte magic, u32 version, then a sequence of chunks. Each
//! chunk is a 4-byte tag, a u32 byte length, a u32 uncompressed length,
//! and an LZ4-compressed payload. Unknown tags are skipped on load for
//! forward-compatibility.

use std::io::{self, Read, Write};

use crate::bounded::Bounds;
use crate::group::{NeuronGroup, SynapseGroup};
use crate::network::{
    Network, NetworkSnapshot, NeuronState, SweepOrder, SynapseState, UpdateRule,
};

pub const MAGIC: &[u8; 8] = b"NEUROS01";
pub const VERSION_V1: u32 = 1;
pub const VERSION_CURRENT: u32 = VERSION_V1;

pub fn compress_lz4(input: &[u8]) -> Vec<u8> {
    lz4_flex::compress(input)
}

pub fn decompress_lz4(input: &[u8], expected_size: usize) -> io::Result<Vec<u8>> {
    // Strict format: raw LZ4 block with external expected size.
    lz4_flex::decompress(input, expected_size)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "lz4 decompression failed"))
}

/// Sink that only counts; used to size an image without allocating it.
pub struct CountingWriter {
    written: usize,
}

impl CountingWriter {
    pub fn new() -> Self {
        Self { written: 0 }
    }

    pub fn written(&self) -> usize {
        self.written
    }
}

impl Default for CountingWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for CountingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written = self.written.saturating_add(buf.len());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn write_u32_le<W: Write>(w: &mut W, v: u32) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

pub fn write_u64_le<W: Write>(w: &mut W, v: u64) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

pub fn write_f64_le<W: Write>(w: &mut W, v: f64) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

pub fn write_bytes<W: Write>(w: &mut W, bytes: &[u8]) -> io::Result<()> {
    write_u32_le(w, bytes.len() as u32)?;
    w.write_all(bytes)
}

pub fn write_string<W: Write>(w: &mut W, s: &str) -> io::Result<()> {
    write_bytes(w, s.as_bytes())
}

pub fn read_exact<const N: usize, R: Read>(r: &mut R) -> io::Result<[u8; N]> {
    let mut buf = [0u8; N];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

pub fn read_u32_le<R: Read>(r: &mut R) -> io::Result<u32> {
    Ok(u32::from_le_bytes(read_exact::<4, _>(r)?))
}

pub fn read_u64_le<R: Read>(r: &mut R) -> io::Result<u64> {
    Ok(u64::from_le_bytes(read_exact::<8, _>(r)?))
}

pub fn read_f64_le<R: Read>(r: &mut R) -> io::Result<f64> {
    Ok(f64::from_le_bytes(read_exact::<8, _>(r)?))
}

pub fn read_bytes<R: Read>(r: &mut R) -> io::Result<Vec<u8>> {
    let n = read_u32_le(r)? as usize;
    let mut buf = vec![0u8; n];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

pub fn read_string<R: Read>(r: &mut R) -> io::Result<String> {
    let bytes = read_bytes(r)?;
    String::from_utf8(bytes)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "invalid utf-8 string"))
}

/// Write a chunk: payload is LZ4-compressed and preceded by the
/// uncompressed length (u32).
pub fn write_chunk_lz4<W: Write>(w: &mut W, tag: [u8; 4], payload: &[u8]) -> io::Result<()> {
    let compressed = compress_lz4(payload);
    let uncompressed_len = payload.len() as u32;
    let total_len = 4u32.saturating_add(
        u32::try_from(compressed.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "chunk too large"))?,
    );

    w.write_all(&tag)?;
    write_u32_le(w, total_len)?;
    write_u32_le(w, uncompressed_len)?;
    w.write_all(&compressed)
}

pub fn read_chunk_header<R: Read>(r: &mut R) -> io::Result<([u8; 4], u32)> {
    let tag = read_exact::<4, _>(r)?;
    let len = read_u32_le(r)?;
    Ok((tag, len))
}

fn invalid(msg: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

fn write_rule<W: Write>(w: &mut W, rule: UpdateRule) -> io::Result<()> {
    match rule {
        UpdateRule::Clamped => write_u32_le(w, 0),
        UpdateRule::Binary { threshold } => {
            write_u32_le(w, 1)?;
            write_f64_le(w, threshold)
        }
        UpdateRule::Linear { slope, offset } => {
            write_u32_le(w, 2)?;
            write_f64_le(w, slope)?;
            write_f64_le(w, offset)
        }
    }
}

fn read_rule<R: Read>(r: &mut R) -> io::Result<UpdateRule> {
    match read_u32_le(r)? {
        0 => Ok(UpdateRule::Clamped),
        1 => Ok(UpdateRule::Binary {
            threshold: read_f64_le(r)?,
        }),
        2 => Ok(UpdateRule::Linear {
            slope: read_f64_le(r)?,
            offset: read_f64_le(r)?,
        }),
        _ => Err(invalid("unknown update rule tag")),
    }
}

fn write_bounds<W: Write>(w: &mut W, bounds: Bounds) -> io::Result<()> {
    write_f64_le(w, bounds.lower)?;
    write_f64_le(w, bounds.upper)
}

fn read_bounds<R: Read>(r: &mut R) -> io::Result<Bounds> {
    let lower = read_f64_le(r)?;
    let upper = read_f64_le(r)?;
    Ok(Bounds::new(lower, upper))
}

fn write_cfg_payload(snapshot: &NetworkSnapshot) -> io::Result<Vec<u8>> {
    let mut payload = Vec::new();
    let order = match snapshot.sweep_order {
        SweepOrder::SeededDraws => 0u32,
        SweepOrder::Permutation => 1,
    };
    write_u32_le(&mut payload, order)?;
    write_u64_le(&mut payload, snapshot.next_neuron_id as u64)?;
    write_u64_le(&mut payload, snapshot.next_synapse_id as u64)?;
    Ok(payload)
}

fn read_cfg_payload<R: Read>(r: &mut R) -> io::Result<(SweepOrder, usize, usize)> {
    let order = match read_u32_le(r)? {
        0 => SweepOrder::SeededDraws,
        1 => SweepOrder::Permutation,
        _ => return Err(invalid("unknown sweep order tag")),
    };
    let next_neuron = read_u64_le(r)? as usize;
    let next_synapse = read_u64_le(r)? as usize;
    Ok((order, next_neuron, next_synapse))
}

fn write_neurons_payload(snapshot: &NetworkSnapshot) -> io::Result<Vec<u8>> {
    let mut payload = Vec::new();
    write_u32_le(&mut payload, snapshot.neurons.len() as u32)?;
    for n in &snapshot.neurons {
        write_u64_le(&mut payload, n.id as u64)?;
        write_f64_le(&mut payload, n.activation)?;
        write_f64_le(&mut payload, n.buffer)?;
        write_bounds(&mut payload, n.bounds)?;
        write_rule(&mut payload, n.rule)?;
    }
    Ok(payload)
}

fn read_neurons_payload<R: Read>(r: &mut R) -> io::Result<Vec<NeuronState>> {
    let count = read_u32_le(r)? as usize;
    let mut neurons = Vec::with_capacity(count);
    for _ in 0..count {
        neurons.push(NeuronState {
            id: read_u64_le(r)? as usize,
            activation: read_f64_le(r)?,
            buffer: read_f64_le(r)?,
            bounds: read_bounds(r)?,
            rule: read_rule(r)?,
        });
    }
    Ok(neurons)
}

fn write_synapses_payload(snapshot: &NetworkSnapshot) -> io::Result<Vec<u8>> {
    let mut payload = Vec::new();
    write_u32_le(&mut payload, snapshot.synapses.len() as u32)?;
    for s in &snapshot.synapses {
        write_u64_le(&mut payload, s.id as u64)?;
        write_u64_le(&mut payload, s.source as u64)?;
        write_u64_le(&mut payload, s.target as u64)?;
        write_f64_le(&mut payload, s.strength)?;
        write_bounds(&mut payload, s.bounds)?;
    }
    Ok(payload)
}

fn read_synapses_payload<R: Read>(r: &mut R) -> io::Result<Vec<SynapseState>> {
    let count = read_u32_le(r)? as usize;
    let mut synapses = Vec::with_capacity(count);
    for _ in 0..count {
        synapses.push(SynapseState {
            id: read_u64_le(r)? as usize,
            source: read_u64_le(r)? as usize,
            target: read_u64_le(r)? as usize,
            strength: read_f64_le(r)?,
            bounds: read_bounds(r)?,
        });
    }
    Ok(synapses)
}

fn write_groups_payload(snapshot: &NetworkSnapshot) -> io::Result<Vec<u8>> {
    let mut payload = Vec::new();
    write_u32_le(&mut payload, snapshot.neuron_groups.len() as u32)?;
    for g in &snapshot.neuron_groups {
        write_string(&mut payload, g.name())?;
        write_u32_le(&mut payload, g.members().len() as u32)?;
        for &id in g.members() {
            write_u64_le(&mut payload, id as u64)?;
        }
    }
    write_u32_le(&mut payload, snapshot.synapse_groups.len() as u32)?;
    for g in &snapshot.synapse_groups {
        write_string(&mut payload, g.name())?;
        write_string(&mut payload, g.source_group())?;
        write_string(&mut payload, g.target_group())?;
        write_u32_le(&mut payload, g.members().len() as u32)?;
        for &id in g.members() {
            write_u64_le(&mut payload, id as u64)?;
        }
    }
    Ok(payload)
}

fn read_groups_payload<R: Read>(r: &mut R) -> io::Result<(Vec<NeuronGroup>, Vec<SynapseGroup>)> {
    let neuron_group_count = read_u32_le(r)? as usize;
    let mut neuron_groups = Vec::with_capacity(neuron_group_count);
    for _ in 0..neuron_group_count {
        let name = read_string(r)?;
        let member_count = read_u32_le(r)? as usize;
        let mut members = Vec::with_capacity(member_count);
        for _ in 0..member_count {
            members.push(read_u64_le(r)? as usize);
        }
        neuron_groups.push(NeuronGroup::new(name, members));
    }
    let synapse_group_count = read_u32_le(r)? as usize;
    let mut synapse_groups = Vec::with_capacity(synapse_group_count);
    for _ in 0..synapse_group_count {
        let name = read_string(r)?;
        let source_group = read_string(r)?;
        let target_group = read_string(r)?;
        let member_count = read_u32_le(r)? as usize;
        let mut members = Vec::with_capacity(member_count);
        for _ in 0..member_count {
            members.push(read_u64_le(r)? as usize);
        }
        synapse_groups.push(SynapseGroup::new(name, source_group, target_group, members));
    }
    Ok((neuron_groups, synapse_groups))
}

impl Network {
    /// Serialize the network as a versioned, chunked image.
    pub fn save_image_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let snapshot = self.snapshot();
        w.write_all(MAGIC)?;
        write_u32_le(w, VERSION_CURRENT)?;

        write_chunk_lz4(w, *b"CFG0", &write_cfg_payload(&snapshot)?)?;
        let mut prng = Vec::new();
        write_u64_le(&mut prng, snapshot.rng_state)?;
        write_chunk_lz4(w, *b"PRNG", &prng)?;
        write_chunk_lz4(w, *b"NRNS", &write_neurons_payload(&snapshot)?)?;
        write_chunk_lz4(w, *b"SYNS", &write_synapses_payload(&snapshot)?)?;
        write_chunk_lz4(w, *b"GRPS", &write_groups_payload(&snapshot)?)?;
        Ok(())
    }

    /// Load a versioned, chunked network image.
    ///
    /// Unknown chunks are skipped for forward-compatibility; the rebuilt
    /// network re-validates every topology invariant.
    pub fn load_image_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let magic = read_exact::<8, _>(r)?;
        if &magic != MAGIC {
            return Err(invalid("bad network image magic"));
        }
        let version = read_u32_le(r)?;
        if version != VERSION_CURRENT {
            return Err(invalid("unsupported network image version"));
        }

        let mut cfg: Option<(SweepOrder, usize, usize)> = None;
        let mut rng_state: Option<u64> = None;
        let mut neurons: Option<Vec<NeuronState>> = None;
        let mut synapses: Option<Vec<SynapseState>> = None;
        let mut groups: Option<(Vec<NeuronGroup>, Vec<SynapseGroup>)> = None;

        loop {
            let (tag, len) = match read_chunk_header(r) {
                Ok(v) => v,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e),
            };

            let payload = {
                let mut take = r.take(len as u64);
                let uncompressed_len = read_u32_le(&mut take)? as usize;
                let mut compressed = Vec::with_capacity((len as usize).saturating_sub(4));
                take.read_to_end(&mut compressed)?;
                decompress_lz4(&compressed, uncompressed_len)?
            };

            let mut cursor = io::Cursor::new(payload);
            match &tag {
                b"CFG0" => cfg = Some(read_cfg_payload(&mut cursor)?),
                b"PRNG" => rng_state = Some(read_u64_le(&mut cursor)?),
                b"NRNS" => neurons = Some(read_neurons_payload(&mut cursor)?),
                b"SYNS" => synapses = Some(read_synapses_payload(&mut cursor)?),
                b"GRPS" => groups = Some(read_groups_payload(&mut cursor)?),
                _ => {
                    // Unknown chunk: skipped.
                }
            }
        }

        let (sweep_order, next_neuron_id, next_synapse_id) =
            cfg.ok_or_else(|| invalid("missing CFG0"))?;
        let rng_state = rng_state.ok_or_else(|| invalid("missing PRNG"))?;
        let neurons = neurons.ok_or_else(|| invalid("missing NRNS"))?;
        let synapses = synapses.ok_or_else(|| invalid("missing SYNS"))?;
        let (neuron_groups, synapse_groups) = groups.unwrap_or_default();

        let snapshot = NetworkSnapshot {
            sweep_order,
            rng_state,
            neurons,
            synapses,
            neuron_groups,
            synapse_groups,
            next_neuron_id,
            next_synapse_id,
        };
        Network::from_snapshot(snapshot)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))
    }

    pub fn save_image_bytes(&self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.save_image_to(&mut buf)?;
        Ok(buf)
    }

    pub fn load_image_bytes(bytes: &[u8]) -> io::Result<Self> {
        let mut cursor = io::Cursor::new(bytes);
        Self::load_image_from(&mut cursor)
    }

    /// Serialized image size in bytes, without materializing the image.
    pub fn image_size_bytes(&self) -> io::Result<usize> {
        let mut counter = CountingWriter::new();
        self.save_image_to(&mut counter)?;
        Ok(counter.written())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hopfield::Hopfield;
    use crate::network::{Neuron, Synapse};

    fn sample_network() -> Network {
        let mut net = Network::with_seed(11);
        let a = net.add_neuron(Neuron::clamped_input());
        let b = net.add_neuron(Neuron::binary());
        let c = net.add_neuron(Neuron::new(
            Bounds::new(0.0, 1.0),
            UpdateRule::Linear {
                slope: 0.5,
                offset: 0.25,
            },
        ));
        net.add_synapse(Synapse::new(a, b, 0.5, Bounds::default()))
            .unwrap();
        net.add_synapse(Synapse::new(b, c, -0.25, Bounds::default()))
            .unwrap();
        net.define_group("in", &[a]).unwrap();
        net.set_activation(a, 0.75);
        net
    }

    #[test]
    fn primitives_roundtrip() {
        let mut buf = Vec::new();
        write_u32_le(&mut buf, 7).unwrap();
        write_u64_le(&mut buf, u64::MAX).unwrap();
        write_f64_le(&mut buf, -0.125).unwrap();
        write_string(&mut buf, "outputs").unwrap();

        let mut cursor = io::Cursor::new(buf);
        assert_eq!(read_u32_le(&mut cursor).unwrap(), 7);
        assert_eq!(read_u64_le(&mut cursor).unwrap(), u64::MAX);
        assert_eq!(read_f64_le(&mut cursor).unwrap(), -0.125);
        assert_eq!(read_string(&mut cursor).unwrap(), "outputs");
    }

    #[test]
    fn lz4_roundtrip() {
        let data = vec![42u8; 4096];
        let compressed = compress_lz4(&data);
        assert!(compressed.len() < data.len());
        assert_eq!(decompress_lz4(&compressed, data.len()).unwrap(), data);
    }

    #[test]
    fn image_roundtrip_preserves_state_and_groups() {
        let net = sample_network();
        let bytes = net.save_image_bytes().unwrap();
        let loaded = Network::load_image_bytes(&bytes).unwrap();

        assert_eq!(loaded.neuron_count(), net.neuron_count());
        assert_eq!(loaded.synapse_count(), net.synapse_count());
        assert_eq!(loaded.activations(), net.activations());
        let a = net.neuron_id_at(0).unwrap();
        let b = net.neuron_id_at(1).unwrap();
        assert_eq!(
            loaded.weight(a, b).unwrap().strength(),
            net.weight(a, b).unwrap().strength()
        );
        assert_eq!(loaded.neuron_group("in").unwrap().members(), &[a]);
    }

    #[test]
    fn hopfield_image_recalls_identically_after_reload() {
        let mut h = Hopfield::new(6).unwrap();
        h.set_pattern(&[1.0, -1.0, 1.0, -1.0, 1.0, -1.0]).unwrap();
        h.train().unwrap();

        let bytes = h.network().save_image_bytes().unwrap();
        let mut reloaded = Network::load_image_bytes(&bytes).unwrap();

        h.update();
        reloaded.update();
        assert_eq!(h.pattern(), reloaded.activations());
    }

    #[test]
    fn bad_magic_is_rejected() {
        let err = Network::load_image_bytes(b"SOMETHIN").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn unknown_chunks_are_skipped() {
        let net = sample_network();
        let mut bytes = net.save_image_bytes().unwrap();
        write_chunk_lz4(&mut bytes, *b"XTRA", &[1, 2, 3]).unwrap();
        let loaded = Network::load_image_bytes(&bytes).unwrap();
        assert_eq!(loaded.neuron_count(), net.neuron_count());
    }

    #[test]
    fn image_size_matches_actual_bytes() {
        let net = sample_network();
        assert_eq!(
            net.image_size_bytes().unwrap(),
            net.save_image_bytes().unwrap().len()
        );
    }
}
